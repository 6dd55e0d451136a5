//! Whole-file and chunked runs over realistic exports.

use chrono::NaiveDate;

use pos_core::{IngestPipeline, PipelineOutput};
use pos_model::{
    BusinessDateSource, IssueKind, PipelineError, PipelineOptions, ReportType, SIDE_CHANNEL_KEY,
};

const ROOM_FILENAME: &str = "包厢开台分析（万象城店）_20251201.csv";

fn room_export() -> String {
    let mut contents = String::from(
        "包厢开台分析表\n\
         统计时间：2025-12-01\n\
         包厢名称,开台单号,开房时间,关房时间,账单合计,房费折扣金额,实收金额,支付方式_微信支付,支付方式_小红书\n",
    );
    for i in 0..7 {
        let close = if i == 4 { "2025-12-01 19:00" } else { "2025-12-01 23:00" };
        let actual = if i == 5 { 250 } else { 280 };
        contents.push_str(&format!(
            "A0{i},6.21234567890123E+15,2025-12-01 20:00,{close},300,20,{actual},200,80\n"
        ));
    }
    contents
}

fn run(options: PipelineOptions) -> PipelineOutput {
    IngestPipeline::new(options)
        .run(room_export().as_bytes(), ROOM_FILENAME, ReportType::Room, None)
        .expect("run pipeline")
}

#[test]
fn room_export_is_cleaned_and_checked() {
    let output = run(PipelineOptions::default());
    assert_eq!(output.records.len(), 7);

    let located: Vec<(i64, &str, IssueKind)> = output
        .report
        .issues
        .iter()
        .map(|issue| (issue.row_index, issue.column.as_str(), issue.kind))
        .collect();
    assert_eq!(
        located,
        vec![
            (5, "actual_amount", IssueKind::Logic),
            (5, "actual_amount", IssueKind::Logic),
            (4, "close_time", IssueKind::Logic),
        ]
    );
    assert!(!output.report.is_valid);

    let record = &output.records[0];
    assert_eq!(record.text("order_no"), Some("6212345678901230"));
    assert_eq!(record.amount("room_discount"), 20.0);
    assert_eq!(
        record
            .side_channel()
            .and_then(|entry| entry.get("pay_xiaohongshu")),
        Some(80.0)
    );
    assert!(record.contains(SIDE_CHANNEL_KEY));

    let summary = &output.report.summary;
    assert_eq!(summary.store_name.as_deref(), Some("万象城店"));
    assert_eq!(summary.business_date_source, Some(BusinessDateSource::Filename));
    assert_eq!(summary.detected_date, NaiveDate::from_ymd_opt(2025, 12, 1));
    let codes: Vec<&str> = summary
        .payment_methods
        .iter()
        .map(|meta| meta.code.as_str())
        .collect();
    assert_eq!(codes, vec!["wechat", "xiaohongshu"]);
}

#[test]
fn repeated_runs_are_identical() {
    assert_eq!(run(PipelineOptions::default()), run(PipelineOptions::default()));
}

#[test]
fn chunked_run_matches_whole_file_run() {
    let options = PipelineOptions::default().with_chunk_size(3);
    let whole = run(options.clone());
    let streamed = IngestPipeline::new(options)
        .run_streaming(room_export().as_bytes(), ROOM_FILENAME, ReportType::Room, None)
        .expect("run streaming");
    assert_eq!(streamed, whole);
}

#[test]
fn fuzzy_label_is_warned_and_counted() {
    let text = "部门,订位人,支付方式_微信支付,实收 金额\n营销部,张三,100,100\n";
    let output = IngestPipeline::default()
        .run(text.as_bytes(), "预订_20251201.csv", ReportType::Booking, None)
        .expect("run pipeline");
    assert!(output.report.is_valid);
    assert_eq!(output.report.summary.fuzzy_match_count, 1);
    assert_eq!(output.report.issues[0].kind, IssueKind::Warning);
    assert_eq!(output.records[0].amount("actual_amount"), 100.0);
}

#[test]
fn unreadable_workbook_fails_in_both_modes() {
    let pipeline = IngestPipeline::default();
    let bytes = b"definitely not a workbook";
    let whole = pipeline.run(bytes, "room.xlsx", ReportType::Room, None);
    let streamed = pipeline.run_streaming(bytes, "room.xlsx", ReportType::Room, None);
    assert!(matches!(whole, Err(PipelineError::Parse { .. })));
    assert!(matches!(streamed, Err(PipelineError::Parse { .. })));
}

#[test]
fn missing_header_is_fatal() {
    let text = "foo,bar\n1,2\n";
    let err = IngestPipeline::default()
        .run(text.as_bytes(), "x_20251201.csv", ReportType::Sales, None)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Header { .. }));
}

#[test]
fn gbk_export_is_decoded() {
    let export = room_export();
    let (bytes, _, unmappable) = encoding_rs::GBK.encode(&export);
    assert!(!unmappable);
    let output = IngestPipeline::default()
        .run(&bytes, ROOM_FILENAME, ReportType::Room, None)
        .expect("run pipeline");
    assert_eq!(output, run(PipelineOptions::default()));
}

#[test]
fn output_survives_json_round_trip() {
    let output = run(PipelineOptions::default());
    let json = serde_json::to_string(&output).expect("serialize output");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse output");
    assert_eq!(value["report"]["total_rows"], 7);
    assert_eq!(value["records"][0]["open_time"], "2025-12-01T20:00:00");
    assert_eq!(value["records"][0]["biz_date"], "2025-12-01");
}

#[test]
fn placeholder_amount_only_flags_its_own_row() {
    let text = "部门,订位人,支付方式_微信支付,支付方式_现金,实收金额\n\
                营销部,张三,60,40,100\n\
                营销部,李四,60,40,待定\n\
                营销部,王五,60,40,100\n";
    let output = IngestPipeline::default()
        .run(text.as_bytes(), "预订汇总_2025-12-01.csv", ReportType::Booking, None)
        .expect("run pipeline");

    assert_eq!(output.records[0].amount("actual_amount"), 100.0);
    assert_eq!(output.records[2].amount("actual_amount"), 100.0);
    assert_eq!(output.records[1].amount("actual_amount"), 0.0);

    let issues = &output.report.issues;
    assert!(
        issues.iter().all(|issue| issue.row_index == 1),
        "unexpected issues on balanced rows: {issues:?}"
    );
    assert!(issues.iter().any(|issue| issue.kind == IssueKind::Data
        && issue.column == "actual_amount"
        && issue.raw_snapshot["actual_amount"] == "待定"));
}
