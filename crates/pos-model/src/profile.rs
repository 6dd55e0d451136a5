//! Per-report-type configuration table.
//!
//! Each [`ReportType`] resolves to one static [`ReportProfile`] holding its
//! source-label dictionary, coercion role sets and validator list. Nothing
//! here is mutated at runtime.

use crate::report_type::ReportType;

/// Canonical field holding the business date.
pub const BUSINESS_DATE_FIELD: &str = "biz_date";

/// How the coercer treats a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    DateTime,
    Integer,
    /// Long numeric identifiers kept as text.
    Identifier,
    Text,
    /// Coerced to numbers. Columns that are not money fields are sampled
    /// first and kept as text when the values do not look numeric.
    Numeric,
}

/// Amount fields read by the business rules and derivations.
pub const MONEY_FIELDS: &[&str] = &[
    "actual_amount",
    "sales_amount",
    "bill_total",
    "cost_total",
    "cost_sales",
    "cost_gift",
    "profit",
    "recharge_real_income",
];

/// Gross-minus-deductions identity for a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillRule {
    pub gross_field: &'static str,
    pub deduction_fields: &'static [&'static str],
}

/// A business rule checked per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Realized amount equals income payments plus side-channel amounts.
    Balance,
    /// Realized amount equals gross minus deductions minus equity payments.
    BillConstruction(BillRule),
    /// Total cost and profit identities of a sales line.
    CostProfit,
    /// Start time is not after end time.
    TemporalOrder {
        start: &'static str,
        end: &'static str,
    },
}

impl RuleKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::BillConstruction(_) => "bill_construction",
            Self::CostProfit => "cost_profit",
            Self::TemporalOrder { .. } => "temporal_order",
        }
    }
}

/// Amount derived from other fields when a marker appears in a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedField {
    pub field: &'static str,
    pub marker_field: &'static str,
    pub marker: &'static str,
    pub addends: &'static [&'static str],
    /// Field overwritten with the derived value as well.
    pub mirror_field: Option<&'static str>,
}

/// Static configuration for one report type.
#[derive(Debug)]
pub struct ReportProfile {
    pub report_type: ReportType,
    /// Human-readable name of the export.
    pub title: &'static str,
    /// Source label to canonical field, in dictionary order.
    pub mapping: &'static [(&'static str, &'static str)],
    /// Numeric fields added with 0 when the source lacks them.
    pub core_numeric_fields: &'static [&'static str],
    pub datetime_fields: &'static [&'static str],
    pub integer_fields: &'static [&'static str],
    pub identifier_fields: &'static [&'static str],
    pub text_fields: &'static [&'static str],
    /// Per-row transaction timestamp used for the business date.
    pub timestamp_field: Option<&'static str>,
    pub derived: Option<DerivedField>,
    pub rules: &'static [RuleKind],
    pub requires_business_date: bool,
    /// Source labels that identify this report type.
    pub detect_columns: &'static [&'static str],
    /// Filename fragments that identify this report type.
    pub detect_filename: &'static [&'static str],
}

impl ReportProfile {
    /// Canonical field for an exact source label.
    pub fn target_for(&self, label: &str) -> Option<&'static str> {
        self.mapping
            .iter()
            .find(|(source, _)| *source == label)
            .map(|(_, target)| *target)
    }

    pub fn is_source_label(&self, label: &str) -> bool {
        self.target_for(label).is_some()
    }

    /// Whether `field` holds money: payment columns, rule operands, derivation
    /// inputs and the core numeric fields. Such columns are always coerced
    /// cell by cell.
    pub fn is_money_field(&self, field: &str) -> bool {
        if self.role(field) != FieldRole::Numeric {
            return false;
        }
        let rule_operand = self.rules.iter().any(|rule| match rule {
            RuleKind::BillConstruction(bill) => {
                bill.gross_field == field || bill.deduction_fields.contains(&field)
            }
            _ => false,
        });
        let derived_input = self
            .derived
            .is_some_and(|derived| derived.addends.contains(&field));
        field.starts_with("pay_")
            || MONEY_FIELDS.contains(&field)
            || self.core_numeric_fields.contains(&field)
            || rule_operand
            || derived_input
    }

    pub fn role(&self, field: &str) -> FieldRole {
        if field == BUSINESS_DATE_FIELD || self.datetime_fields.contains(&field) {
            FieldRole::DateTime
        } else if self.integer_fields.contains(&field) {
            FieldRole::Integer
        } else if self.identifier_fields.contains(&field) {
            FieldRole::Identifier
        } else if self.text_fields.contains(&field) {
            FieldRole::Text
        } else {
            FieldRole::Numeric
        }
    }
}

const PAYMENT_MAPPING_COMMON: [(&str, &str); 22] = [
    ("支付方式_微信支付", "pay_wechat"),
    ("支付方式_支付宝", "pay_alipay"),
    ("支付方式_会员支付", "pay_member"),
    ("支付方式_会员本金", "pay_member_principal"),
    ("支付方式_会员赠送", "pay_member_gift"),
    ("支付方式_现金", "pay_cash"),
    ("支付方式_pos银行卡", "pay_pos_card"),
    ("支付方式_服务员收款", "pay_waiter"),
    ("支付方式_员工信用扣款", "pay_employee_credit"),
    ("支付方式_付呗", "pay_fubei"),
    ("支付方式_团购", "pay_groupon"),
    ("支付方式_店长签单", "pay_manager_sign"),
    ("支付方式_演绎提成", "pay_performance_commission"),
    ("支付方式_抖音", "pay_douyin"),
    ("支付方式_POS机", "pay_pos"),
    ("支付方式_营销提成", "pay_marketing_commission"),
    ("支付方式_过期取酒", "pay_expired_wine"),
    ("支付方式_招待", "pay_entertainment"),
    ("支付方式_会员停用", "pay_member_disabled"),
    ("支付方式_三倍充值活动", "pay_triple_recharge"),
    ("支付方式_往来款", "pay_inter_account"),
    ("支付方式_人员打折", "pay_staff_discount"),
];

const fn concat_mapping<const A: usize, const B: usize, const N: usize>(
    head: [(&'static str, &'static str); A],
    tail: [(&'static str, &'static str); B],
) -> [(&'static str, &'static str); N] {
    let mut out = [("", ""); N];
    let mut i = 0;
    while i < A {
        out[i] = head[i];
        i += 1;
    }
    let mut j = 0;
    while j < B {
        out[A + j] = tail[j];
        j += 1;
    }
    out
}

const BOOKING_MAPPING: [(&str, &str); 39] = concat_mapping(
    [
        ("部门", "department"),
        ("订位人", "employee_name"),
        ("订台数", "booking_qty"),
        ("销售金额", "sales_amount"),
        ("服务费", "service_fee"),
        ("自动扣减", "auto_deduction"),
        ("基本业绩", "base_performance"),
        ("免单金额", "free_amount"),
        ("挂账金额", "credit_amount"),
        ("调整金额", "adjustment_amount"),
        ("折扣金额", "discount_amount"),
        ("抹零金额", "round_off_amount"),
        ("赠送金额", "gift_amount"),
        ("实收金额", "actual_amount"),
        ("酒水类别金额_过期取酒", "beverage_expired_wine"),
        ("酒水类别金额_小计", "beverage_subtotal"),
        ("支付方式_高德", "pay_gaode"),
    ],
    PAYMENT_MAPPING_COMMON,
);

const ROOM_MAPPING: [(&str, &str); 52] = concat_mapping(
    [
        ("包厢名称", "room_no"),
        ("包厢类型", "room_type"),
        ("区域名称", "area_name"),
        ("开台单号", "order_no"),
        ("开房计费模式", "billing_mode"),
        ("开房时间", "open_time"),
        ("关房时间", "close_time"),
        ("清洁时间", "clean_time"),
        ("营业日", "biz_date"),
        ("消费时长", "duration_min"),
        ("时段", "time_slot"),
        ("账单备注", "bill_remark"),
        ("账单合计", "bill_total"),
        ("应收金额", "receivable_amount"),
        ("实收金额", "actual_amount"),
        ("赠送", "gift_amount"),
        ("抹零金额", "round_off_amount"),
        ("调整金额", "adjustment_amount"),
        ("挂账金额", "credit_amount"),
        ("免单金额", "free_amount"),
        ("房费折扣金额", "room_discount"),
        ("酒水折扣金额", "beverage_discount"),
        ("基本业绩", "base_performance"),
        ("低消费", "min_consumption"),
        ("低消差额", "min_consumption_diff"),
        ("计入低消金额", "included_min_consumption"),
        ("不计入低消金额", "excluded_min_consumption"),
        ("特饮金额", "special_drink_amount"),
        ("支付方式_美团", "pay_meituan"),
        ("支付方式_高德", "pay_gaode"),
    ],
    PAYMENT_MAPPING_COMMON,
);

const SALES_MAPPING: [(&str, &str); 24] = [
    ("酒水名称", "product_name"),
    ("类别名称", "category_name"),
    ("单位", "unit"),
    ("区域", "area"),
    ("成本_小计", "cost_total"),
    ("成本_销售", "cost_sales"),
    ("成本_赠送", "cost_gift"),
    ("利润", "profit"),
    ("利润率", "profit_rate"),
    ("合计_数量", "total_quantity"),
    ("合计_金额", "total_amount"),
    ("销售数量_小计", "sales_qty"),
    ("销售数量_销售", "sales_qty_sales"),
    ("销售数量_套餐子物品", "sales_qty_package"),
    ("销售数量_例送子物品", "sales_qty_example"),
    ("销售金额_小计", "sales_amount"),
    ("销售金额_销售", "sales_amount_sales"),
    ("销售金额_套餐子物品", "sales_amount_package"),
    ("赠送数量_小计", "gift_qty"),
    ("赠送数量_赠送", "gift_qty_gift"),
    ("赠送数量_套餐子物品", "gift_qty_combo"),
    ("赠送金额_小计", "gift_amount"),
    ("赠送金额_赠送", "gift_amount_gift"),
    ("赠送金额_套餐子物品", "gift_amount_combo"),
];

const MEMBER_CHANGE_MAPPING: [(&str, &str); 27] = [
    ("会员名称", "member_name"),
    ("会员卡号", "card_no"),
    ("会员等级", "member_level"),
    ("联系电话", "phone"),
    ("变动类型", "change_type"),
    ("充值类型", "recharge_type"),
    ("建卡门店", "card_store_name"),
    ("商家门店", "biz_store_name"),
    ("房费变动金额_本金", "room_amount_principal"),
    ("房费变动金额_赠送", "room_amount_gift"),
    ("酒水变动金额_本金", "drink_amount_principal"),
    ("酒水变动金额_赠送", "drink_amount_gift"),
    ("成长值_变动", "growth_delta"),
    ("成长值_余额", "growth_balance"),
    ("变动积分", "points_delta"),
    ("积分余额", "points_balance"),
    ("余额_合计", "balance_total"),
    ("余额_本金", "balance_principal"),
    ("余额_赠送", "balance_gift"),
    ("支付信息", "pay_info"),
    ("充值销售人", "salesperson_recharge"),
    ("免单人", "free_by"),
    ("免单金额", "free_amount"),
    ("备注", "remark"),
    ("状态", "status"),
    ("变动时间", "change_time"),
    ("操作人", "operator"),
];

const INTEGER_FIELDS: &[&str] = &[
    "booking_qty",
    "total_quantity",
    "duration_min",
    "sales_qty",
    "sales_qty_sales",
    "sales_qty_package",
    "sales_qty_example",
    "gift_qty",
    "gift_qty_gift",
    "gift_qty_combo",
    "growth_delta",
    "growth_balance",
    "points_delta",
    "points_balance",
];

pub static BOOKING_PROFILE: ReportProfile = ReportProfile {
    report_type: ReportType::Booking,
    title: "预订汇总",
    mapping: &BOOKING_MAPPING,
    core_numeric_fields: &["booking_qty"],
    datetime_fields: &[],
    integer_fields: INTEGER_FIELDS,
    identifier_fields: &[],
    text_fields: &["department", "employee_name"],
    timestamp_field: None,
    derived: None,
    rules: &[
        RuleKind::Balance,
        RuleKind::BillConstruction(BillRule {
            gross_field: "sales_amount",
            deduction_fields: &[
                "free_amount",
                "credit_amount",
                "discount_amount",
                "round_off_amount",
                "adjustment_amount",
            ],
        }),
    ],
    requires_business_date: true,
    detect_columns: &["订位人", "订台数"],
    detect_filename: &["预订"],
};

pub static ROOM_PROFILE: ReportProfile = ReportProfile {
    report_type: ReportType::Room,
    title: "包厢开台分析",
    mapping: &ROOM_MAPPING,
    core_numeric_fields: &["duration_min"],
    datetime_fields: &["open_time", "close_time", "clean_time"],
    integer_fields: INTEGER_FIELDS,
    identifier_fields: &["order_no"],
    text_fields: &[
        "room_no",
        "room_type",
        "area_name",
        "billing_mode",
        "time_slot",
        "bill_remark",
    ],
    timestamp_field: None,
    derived: None,
    rules: &[
        RuleKind::Balance,
        RuleKind::BillConstruction(BillRule {
            gross_field: "bill_total",
            deduction_fields: &[
                "round_off_amount",
                "adjustment_amount",
                "credit_amount",
                "free_amount",
                "room_discount",
                "beverage_discount",
            ],
        }),
        RuleKind::TemporalOrder {
            start: "open_time",
            end: "close_time",
        },
    ],
    requires_business_date: true,
    detect_columns: &["开台单号", "包厢名称"],
    detect_filename: &["包厢"],
};

pub static SALES_PROFILE: ReportProfile = ReportProfile {
    report_type: ReportType::Sales,
    title: "酒水销售分析",
    mapping: &SALES_MAPPING,
    core_numeric_fields: &[],
    datetime_fields: &[],
    integer_fields: INTEGER_FIELDS,
    identifier_fields: &[],
    text_fields: &["product_name", "category_name", "unit", "area"],
    timestamp_field: None,
    derived: None,
    rules: &[RuleKind::CostProfit],
    requires_business_date: true,
    detect_columns: &["酒水名称", "类别名称"],
    detect_filename: &["酒水"],
};

pub static MEMBER_CHANGE_PROFILE: ReportProfile = ReportProfile {
    report_type: ReportType::MemberChange,
    title: "会员账户变动明细",
    mapping: &MEMBER_CHANGE_MAPPING,
    core_numeric_fields: &[
        "room_amount_principal",
        "room_amount_gift",
        "drink_amount_principal",
        "drink_amount_gift",
        "balance_total",
        "balance_principal",
        "balance_gift",
        "growth_delta",
        "growth_balance",
        "points_delta",
        "points_balance",
        "free_amount",
    ],
    datetime_fields: &["change_time"],
    integer_fields: INTEGER_FIELDS,
    identifier_fields: &["card_no", "phone"],
    text_fields: &[
        "member_name",
        "member_level",
        "card_store_name",
        "biz_store_name",
        "change_type",
        "recharge_type",
        "status",
        "operator",
        "salesperson_recharge",
        "free_by",
        "pay_info",
        "remark",
    ],
    timestamp_field: Some("change_time"),
    derived: Some(DerivedField {
        field: "recharge_real_income",
        marker_field: "change_type",
        marker: "充值",
        addends: &["room_amount_principal", "drink_amount_principal"],
        mirror_field: Some("actual_amount"),
    }),
    rules: &[],
    requires_business_date: true,
    detect_columns: &["会员卡号", "变动类型"],
    detect_filename: &["会员"],
};
