use smsf_core::{build_filter, DocType, DocumentChunk, Error, FilterKey, FilterSet};

fn chunk(id: &str, doc_type: DocType, fund_id: &str) -> DocumentChunk {
    DocumentChunk {
        id: id.to_string(),
        doc_id: id.to_string(),
        source: format!("{id}.txt"),
        doc_type,
        fund_id: fund_id.to_string(),
        section: None,
        clause: None,
        content: "Trustees may borrow under a limited recourse borrowing arrangement.".to_string(),
        chunk_index: 0,
        total_chunks: 1,
        is_latest: true,
    }
}

#[test]
fn private_deed_filter_pins_fund_and_doc_type() {
    for fund in ["FUND_A", "FUND_B", "SMSF_12345", "o'brien family fund"] {
        let filter = FilterSet::private_deed(fund).expect("filter");
        assert_eq!(filter.values_for(FilterKey::FundId), Some(&[fund.to_string()][..]));
        assert_eq!(filter.values_for(FilterKey::DocType), Some(&["trust_deed".to_string()][..]));
        filter.ensure_private_isolation(fund).expect("isolated");
    }
}

#[test]
fn private_deed_filter_rejects_missing_or_global_fund() {
    for fund in ["", "   ", "global", "GLOBAL"] {
        let err = FilterSet::private_deed(fund).unwrap_err();
        assert!(matches!(err, Error::PartitionIsolationViolation(_)), "fund={fund:?} err={err}");
    }
    let err = build_filter(&[DocType::TrustDeed], None).unwrap_err();
    assert!(matches!(err, Error::PartitionIsolationViolation(_)));
}

#[test]
fn private_deed_filter_never_matches_another_fund() {
    let filter = FilterSet::private_deed("FUND_A").expect("filter");
    assert!(filter.matches(&chunk("a", DocType::TrustDeed, "FUND_A")));
    assert!(!filter.matches(&chunk("b", DocType::TrustDeed, "FUND_B")));
    assert!(!filter.matches(&chunk("c", DocType::Legislation, "global")));
    assert!(!filter.matches(&chunk("d", DocType::Legislation, "FUND_A")));
}

#[test]
fn isolation_check_flags_filters_without_fund_predicate() {
    let public = FilterSet::public_law();
    assert!(matches!(public.ensure_private_isolation("FUND_A"), Err(Error::PartitionIsolationViolation(_))));
    let other = FilterSet::private_deed("FUND_B").expect("filter");
    assert!(matches!(other.ensure_private_isolation("FUND_A"), Err(Error::PartitionIsolationViolation(_))));
}

#[test]
fn public_law_filter_covers_legislation_and_rulings_only() {
    let filter = FilterSet::public_law();
    assert!(filter.values_for(FilterKey::FundId).is_none());
    assert!(filter.matches(&chunk("s", DocType::Legislation, "global")));
    assert!(filter.matches(&chunk("r", DocType::AtoRuling, "global")));
    assert!(!filter.matches(&chunk("d", DocType::TrustDeed, "FUND_A")));
    assert_eq!(filter.to_sql().as_deref(), Some("doc_type IN ('legislation', 'ato_ruling')"));
}

#[test]
fn sql_rendering_escapes_quotes() {
    let filter = FilterSet::private_deed("o'brien").expect("filter");
    assert_eq!(filter.to_sql().as_deref(), Some("fund_id = 'o''brien' AND doc_type = 'trust_deed'"));
}

#[test]
fn build_filter_requires_a_doc_type() {
    assert!(matches!(build_filter(&[], Some("FUND_A")), Err(Error::InvalidRequest(_))));
}

#[test]
fn chunk_tag_invariant() {
    assert!(chunk("ok", DocType::TrustDeed, "FUND_A").validate_tags().is_ok());
    assert!(chunk("ok", DocType::AtoRuling, "global").validate_tags().is_ok());
    assert!(matches!(chunk("bad", DocType::TrustDeed, "global").validate_tags(), Err(Error::InvalidChunk(_))));
    assert!(matches!(chunk("bad", DocType::Legislation, "FUND_A").validate_tags(), Err(Error::InvalidChunk(_))));
}

#[test]
fn public_scope_ignores_the_requesting_fund() {
    let filter = build_filter(&[DocType::Legislation], Some("FUND_A")).expect("filter");
    assert!(filter.values_for(FilterKey::FundId).is_none());
    assert_eq!(filter.to_sql().as_deref(), Some("doc_type = 'legislation'"));
    assert!(filter.matches(&chunk("s", DocType::Legislation, "global")));

    let global = build_filter(&[DocType::Legislation, DocType::AtoRuling], Some("global")).expect("filter");
    assert_eq!(global, FilterSet::public_law());
}

#[test]
fn mixed_deed_and_public_scope_is_rejected() {
    let err = build_filter(&DocType::ALL, Some("FUND_A")).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)), "{err}");
}

#[test]
fn document_filter_pins_one_doc_id() {
    let filter = FilterSet::document("sis_act").expect("filter");
    assert_eq!(filter.to_sql().as_deref(), Some("doc_id = 'sis_act'"));
    let mut other = chunk("tr", DocType::AtoRuling, "global");
    other.doc_id = "TR_2010_1".to_string();
    assert!(filter.matches(&chunk("sis_act", DocType::Legislation, "global")));
    assert!(!filter.matches(&other));
    assert!(matches!(FilterSet::document("  "), Err(Error::InvalidRequest(_))));
}
