//! End-to-end runs of the parsing pipeline over small statements.

use passbook_analytics::StatementSummary;
use passbook_core::{Direction, PipelineConfig, WarningKind, keys};
use passbook_ingest::{Document, IngestError, Institution, detect_institution, parse};
use rust_decimal::Decimal;

fn d(units: i64) -> Decimal {
    Decimal::new(units, 2)
}

const KOTAK: &str = r#"
Kotak Mahindra Bank
RAVI KUMAR                     Period : 01-04-2022 to 30-06-2022
12 MG ROAD                     Account No : 1234567890
Date Narration Chq/Ref No Withdrawal (Dr) Deposit (Cr) Balance
B/F 10,000.00(Cr)
01-04-2022 UPI/SWIGGY/209112345678/food UPI-209112345678 250.00(Dr) 9,750.00(Cr)
05-04-2022 SALARY APR 2022 NEFT-KKBKH22095123456 50,000.00(Cr) 59,750.00(Cr)
Page 1 of 2
30-06-2022 Int.Pd:1234567890:01-04-2022 to 30-
06-2022 123.00(Cr) 59,873.00(Cr)
Statement Summary
"#;

#[test]
fn test_kotak_statement_end_to_end() {
    let doc = Document::from_text(KOTAK);
    let parsed = parse(&doc, Institution::Kotak, &PipelineConfig::default()).unwrap();
    let ledger = &parsed.ledger;

    assert!(ledger.is_clean(), "{:?}", ledger.warnings());
    assert_eq!(ledger.opening_balance(), Some(d(1_000_000)));
    assert_eq!(ledger.closing_balance(), Some(d(5_987_300)));

    let rows = ledger.transactions();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].debit, Some(d(25_000)));
    assert_eq!(rows[2].credit, Some(d(5_000_000)));
    assert_eq!(rows[3].credit, Some(d(12_300)));
    assert_eq!(rows[3].narration, "Int.Pd:1234567890:01-04-2022 to 30-06-2022");

    // Every clean row satisfies previous + credit - debit == balance.
    for pair in rows.windows(2) {
        let signed = pair[1].signed_amount().unwrap();
        assert_eq!(pair[0].balance + signed, pair[1].balance);
    }

    assert_eq!(parsed.metadata.get(keys::ACCOUNT_HOLDER), "RAVI KUMAR");
    assert_eq!(parsed.metadata.get(keys::ACCOUNT_NUMBER), "1234567890");
    assert_eq!(parsed.keyword_frequency[0], ("2022".to_string(), 3));
    assert_eq!(parsed.keyword_frequency[1], ("UPI".to_string(), 1));
}

#[test]
fn test_bad_lines_become_warnings() {
    let text = "\
Kotak Mahindra Bank
B/F 1,000.00(Cr)
01-04-2022 ATM 100.00(Dr) 950.00(Cr)
02-04-2022 BROKEN LINE
03-04-2022 POS 50.00(Dr) 900.00(Cr)
";
    let parsed = parse(&Document::from_text(text), Institution::Kotak, &PipelineConfig::default()).unwrap();
    let ledger = &parsed.ledger;

    assert_eq!(ledger.transactions().len(), 3);
    let kinds: Vec<_> = ledger.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::MalformedLine, WarningKind::BalanceMismatch]);
    assert!(ledger.warnings()[0].message.contains("BROKEN LINE"));
    assert_eq!(ledger.warnings()[1].row, Some(1));
    assert!(ledger.transactions()[1].has_warning(WarningKind::BalanceMismatch));
}

#[test]
fn test_central_bank_directions_from_balance_moves() {
    let text = r#"
CENTRAL BANK OF INDIA
BROUGHT FORWARD : 10,000.00Cr
01/04/22 01/04/22 UPI/SWIGGY . - 250.00 9,750.00Cr
. . FOOD ORDER .
05/04/22 06/04/22 BY TRANSFER SALARY . 123456 50,000.00 59,750.00Cr
07/04/22 07/04/22 SMS CHARGES . - - 59,735.00Cr
"#;
    let parsed = parse(&Document::from_text(text), Institution::CentralBank, &PipelineConfig::default()).unwrap();
    let rows = parsed.ledger.transactions();
    assert!(parsed.ledger.is_clean(), "{:?}", parsed.ledger.warnings());
    assert_eq!(rows[1].direction(), Some(Direction::Debit));
    assert_eq!(rows[2].direction(), Some(Direction::Credit));
    // Amount derived from the delta.
    assert_eq!(rows[3].debit, Some(d(1_500)));
}

#[test]
fn test_iob_statement_with_brought_forward() {
    let text = r#"
INDIAN OVERSEAS BANK, MAHALAKSHMIPURAM, BANGALORE Page 1
Account Number :2314569874512563/INR JOHN DOE
ACCOUNT OPENING BALANCE : 5,000.00CR
16-04-2019S42347939 REF001 UPI/SWIGGY/FOOD 250.00 4,750.00CR
17-04-2019S42347940 - NEFT SALARY APRIL 20,000.00 24,750.00CR
INDIAN OVERSEAS BANK, MAHALAKSHMIPURAM, BANGALORE Page 2
BROUGHT FORWARD 24,750.00CR
20-04-2019S42347999 CHQ123 ATM WDL 30,000.00 5,250.00DR
"#;
    let parsed = parse(&Document::from_text(text), Institution::Iob, &PipelineConfig::default()).unwrap();
    assert!(parsed.ledger.is_clean(), "{:?}", parsed.ledger.warnings());
    let summary = StatementSummary::from_ledger(&parsed.ledger);
    assert_eq!(summary.transaction_count, 3);
    assert_eq!(summary.total_debit, d(3_025_000));
    assert_eq!(summary.total_credit, d(2_000_000));
    assert_eq!(summary.closing_balance, Some(d(-525_000)));
}

const SBI_JSON: &str = r#"{
  "pages": [
    {
      "text": "STATE BANK OF INDIA\nKORAMANGALA BRANCH\nAccount No : 30123456789",
      "table": [
        ["Post Date", "Value Date", "Description", "Cheque No/Reference", "Debit", "Credit", "Balance"],
        [null, null, "BROUGHT FORWARD", null, null, null, "10,000.00"],
        ["01-04-2023", "01-04-2023", "UPI/DR/309112345678/\nSWIGGY", "", "250.00", "", "9,750.00"],
        ["05 Apr 2023", "05 Apr 2023", "NEFT SALARY", "NEFT123", "", "50,000.00", "59,750.00"]
      ]
    },
    {
      "text": "",
      "table": [
        ["Post Date", "Value Date", "Description", "Cheque No/Reference", "Debit", "Credit", "Balance"],
        ["06/04/2023", null, "REVERSAL", "-", "100.00", "100.00", "59,750.00"]
      ]
    }
  ]
}"#;

#[test]
fn test_sbi_tables_across_pages() {
    let doc = Document::from_json_str(SBI_JSON).unwrap();
    let parsed = parse(&doc, Institution::Sbi, &PipelineConfig::default()).unwrap();
    let ledger = &parsed.ledger;

    assert_eq!(ledger.transactions().len(), 4);
    assert_eq!(ledger.transactions()[2].credit, Some(d(5_000_000)));
    assert_eq!(parsed.metadata.get(keys::BRANCH), "KORAMANGALA BRANCH");

    // Debit and credit both filled with no balance move: flagged, not guessed.
    let kinds: Vec<_> = ledger.warnings().iter().map(|w| w.kind).collect();
    assert_eq!(
        kinds,
        vec![WarningKind::AmbiguousAmount, WarningKind::IndeterminateDirection]
    );
    assert_eq!(ledger.warnings()[0].row, Some(3));
    assert_eq!(ledger.transactions()[3].direction(), None);
}

#[test]
fn test_sbi_description_continues_on_next_page() {
    let json = r#"{
  "pages": [
    {
      "text": "STATE BANK OF INDIA\nAccount No : 30123456789",
      "table": [
        ["Post Date", "Value Date", "Description", "Cheque No/Reference", "Debit", "Credit", "Balance"],
        [null, null, "BROUGHT FORWARD", null, null, null, "10,000.00"],
        ["01-04-2023", "01-04-2023", "UPI/DR/309112345678/", "", "250.00", "", "9,750.00"]
      ]
    },
    {
      "text": "",
      "table": [
        ["Post Date", "Value Date", "Description", "Cheque No/Reference", "Debit", "Credit", "Balance"],
        [null, null, "SWIGGY FOOD ORDER", null, null, null, null],
        ["05-04-2023", "05-04-2023", "NEFT SALARY", "NEFT123", "", "50,000.00", "59,750.00"]
      ]
    }
  ]
}"#;
    let doc = Document::from_json_str(json).unwrap();
    let parsed = parse(&doc, Institution::Sbi, &PipelineConfig::default()).unwrap();
    let ledger = &parsed.ledger;

    assert!(ledger.is_clean(), "{:?}", ledger.warnings());
    let narrations: Vec<_> = ledger.transactions().iter().map(|t| t.narration.as_str()).collect();
    assert_eq!(
        narrations,
        vec!["BROUGHT FORWARD", "UPI/DR/309112345678/ SWIGGY FOOD ORDER", "NEFT SALARY"]
    );
    assert_eq!(ledger.transactions()[1].debit, Some(d(25_000)));
    assert_eq!(ledger.transactions()[2].credit, Some(d(5_000_000)));
}

#[test]
fn test_axis_headerless_page_uses_earlier_column_order() {
    // Particulars printed before Chq No, unlike the usual Axis order.
    let json = r#"{
  "pages": [
    {
      "text": "AXIS BANK\nStatement of Account No : 912010012345678",
      "table": [
        ["Tran Date", "Particulars", "Chq No", "Debit", "Credit", "Balance", "Init. Br"],
        ["", "OPENING BALANCE", "", "", "", "5,000.00", ""]
      ]
    },
    {
      "text": "",
      "table": [
        ["02-04-2023", "ATM-CASH", "", "500.00", "", "4,500.00", "1234"],
        ["03-04-2023", "NEFT SALARY", "", "", "20,000.00", "24,500.00", "1234"]
      ]
    }
  ]
}"#;
    let doc = Document::from_json_str(json).unwrap();
    let parsed = parse(&doc, Institution::Axis, &PipelineConfig::default()).unwrap();
    let ledger = &parsed.ledger;

    assert!(ledger.is_clean(), "{:?}", ledger.warnings());
    let rows = ledger.transactions();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].debit, Some(d(50_000)));
    assert_eq!(rows[2].credit, Some(d(2_000_000)));
    assert_eq!(ledger.closing_balance(), Some(d(2_450_000)));
}

#[test]
fn test_kotak_narration_number_read_as_amount() {
    // Withdrawal and deposit both non-zero: 25.00 is printed where the
    // deposit belongs, but only a 500.00 debit explains the balance.
    let text = "\
Kotak Mahindra Bank
B/F 10,000.00(Cr)
01-04-2022 CHQ 500.00 25.00 9,500.00(Cr)
";
    let parsed = parse(&Document::from_text(text), Institution::Kotak, &PipelineConfig::default()).unwrap();
    let ledger = &parsed.ledger;

    let row = &ledger.transactions()[1];
    assert_eq!(row.debit, Some(d(50_000)));
    assert_eq!(row.credit, None);
    assert_eq!(row.narration, "CHQ 500.00");
    assert!(row.has_warning(WarningKind::AmbiguousAmount));

    assert_eq!(ledger.warnings().len(), 1);
    assert_eq!(ledger.warnings()[0].kind, WarningKind::AmbiguousAmount);
    assert_eq!(ledger.warnings()[0].row, Some(1));
    assert!(
        ledger.warnings()[0]
            .message
            .starts_with("read amount as 500.00 rather than 25.00")
    );
}

#[test]
fn test_detect_then_parse_rbl() {
    let text = r#"
RBL BANK LTD
Accountholder Name : PRIYA SHARMA
Opening Balance 15,000.00
Date Transaction Details Chq/Ref No Value Date Withdrawal Amt Deposit Amt Balance
01-Apr-2023 UPI/309112345678/ZOMATO 01-Apr-2023 450.00 14,550.00
03-Apr-2023 NEFT/SALARY/ACME 04-Apr-2023 60,000.00 74,550.00
05-Apr-2023 DEBIT CARD ANNUAL FEE 05-Apr-2023 74,050.00
"#;
    let doc = Document::from_text(text);
    let institution = detect_institution(&doc, 40).unwrap().unwrap();
    assert_eq!(institution, Institution::Rbl);

    let parsed = parse(&doc, institution, &PipelineConfig::default()).unwrap();
    assert!(parsed.ledger.is_clean(), "{:?}", parsed.ledger.warnings());
    let summary = StatementSummary::from_ledger(&parsed.ledger);
    assert_eq!(summary.debit_count, 2);
    assert_eq!(summary.total_debit, d(95_000));
    assert_eq!(summary.total_credit, d(6_000_000));
    assert_eq!(summary.first_date.unwrap().to_string(), "2023-04-01");
}

#[test]
fn test_repeated_runs_are_identical() {
    let doc = Document::from_json_str(SBI_JSON).unwrap();
    let config = PipelineConfig::default();
    let first = serde_json::to_string(&parse(&doc, Institution::Sbi, &config).unwrap()).unwrap();
    let second = serde_json::to_string(&parse(&doc, Institution::Sbi, &config).unwrap()).unwrap();
    assert_eq!(first, second);

    let doc = Document::from_text(KOTAK);
    let a = parse(&doc, Institution::Kotak, &config).unwrap();
    let b = parse(&doc, Institution::Kotak, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_missing_value_sentinel_is_configurable() {
    let config = PipelineConfig {
        missing_value: String::new(),
        ..PipelineConfig::default()
    };
    let parsed = parse(&Document::from_text(KOTAK), Institution::Kotak, &config).unwrap();
    assert_eq!(parsed.metadata.get("IFSC Code"), "");
    assert_eq!(parsed.metadata.get(keys::BANK), "KOTAK MAHINDRA BANK");
}

#[test]
fn test_empty_document_is_the_only_hard_failure() {
    let err = parse(&Document::from_text(""), Institution::Axis, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, IngestError::UnreadableDocument { .. }));
    assert!(err.to_string().contains("unreadable"));
}
