//! Payment-method catalog: categories, display names and sort order.

use serde::{Deserialize, Serialize};

/// Label prefix shared by every payment-method column in the exports.
pub const PAYMENT_LABEL_PREFIX: &str = "支付方式_";

/// Canonical field prefix for payment methods.
pub const PAYMENT_FIELD_PREFIX: &str = "pay_";

/// Payment fields counted toward the realized amount.
pub const INCOME_PAYMENT_FIELDS: &[&str] = &[
    "pay_wechat",
    "pay_alipay",
    "pay_cash",
    "pay_pos_card",
    "pay_waiter",
    "pay_fubei",
    "pay_groupon",
    "pay_douyin",
    "pay_pos",
    "pay_gaode",
    "pay_meituan",
];

/// Equity/cost payment fields, deducted from the gross bill.
pub const EQUITY_PAYMENT_FIELDS: &[&str] = &[
    "pay_member",
    "pay_member_principal",
    "pay_member_gift",
    "pay_employee_credit",
    "pay_manager_sign",
    "pay_performance_commission",
    "pay_marketing_commission",
    "pay_expired_wine",
    "pay_entertainment",
    "pay_member_disabled",
    "pay_staff_discount",
    "pay_triple_recharge",
];

/// Aggregate member payment.
pub const MEMBER_AGGREGATE_FIELD: &str = "pay_member";

/// Principal/gift breakdown of the member payment.
pub const MEMBER_BREAKDOWN_FIELDS: &[&str] = &["pay_member_principal", "pay_member_gift"];

/// (code, display name, sort order)
const CATALOG: &[(&str, &str, i32)] = &[
    ("wechat", "微信支付", 10),
    ("alipay", "支付宝", 20),
    ("cash", "现金", 30),
    ("pos", "POS机", 40),
    ("pos_card", "POS银行卡", 50),
    ("douyin", "抖音", 60),
    ("meituan", "美团", 70),
    ("gaode", "高德", 80),
    ("member", "会员支付", 100),
    ("member_principal", "会员本金", 110),
    ("member_gift", "会员赠送", 120),
    ("member_disabled", "会员停用", 130),
    ("waiter", "服务员收款", 140),
    ("fubei", "付呗", 150),
    ("groupon", "团购/核销", 160),
    ("manager_sign", "店长签单", 170),
    ("employee_credit", "员工信用扣款", 180),
    ("performance_commission", "演绎提成", 190),
    ("marketing_commission", "营销提成", 200),
    ("expired_wine", "过期取酒", 210),
    ("entertainment", "招待", 220),
    ("triple_recharge", "三倍充值活动", 230),
    ("inter_account", "往来款", 240),
    ("staff_discount", "人员打折", 250),
];

const FIXED_DEFAULT_SORT: i32 = 500;
const DYNAMIC_DEFAULT_SORT: i32 = 900;

/// Accounting category of a payment field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentCategory {
    Income,
    Equity,
    Other,
}

impl PaymentCategory {
    pub fn classify(field: &str) -> Self {
        if INCOME_PAYMENT_FIELDS.contains(&field) {
            Self::Income
        } else if EQUITY_PAYMENT_FIELDS.contains(&field) {
            Self::Equity
        } else {
            Self::Other
        }
    }
}

/// Whether a payment field is a fixed canonical column or came from the side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSource {
    Fixed,
    Dynamic,
}

/// Catalog code for a payment field: the field without `pay_`, lowercased.
pub fn payment_code(field: &str) -> Option<String> {
    let trimmed = field.trim();
    let lower = trimmed.to_lowercase();
    let code = lower.strip_prefix(PAYMENT_FIELD_PREFIX)?;
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

/// Display name for a catalog code, falling back to the code itself.
pub fn display_name(code: &str) -> String {
    CATALOG
        .iter()
        .find(|(known, _, _)| *known == code)
        .map_or_else(|| code.to_string(), |(_, name, _)| (*name).to_string())
}

pub fn sort_order(code: &str, source: PaymentSource) -> i32 {
    CATALOG
        .iter()
        .find(|(known, _, _)| *known == code)
        .map_or(
            match source {
                PaymentSource::Fixed => FIXED_DEFAULT_SORT,
                PaymentSource::Dynamic => DYNAMIC_DEFAULT_SORT,
            },
            |(_, _, order)| *order,
        )
}
