use adsgrid_recon::model::{Action, Cell, InputKind, SheetData, WorkbookData};
use adsgrid_recon::{run, ReportConfig, ReportError, ReportInput, ReportMode, RoasSource};

fn t(s: &str) -> Cell {
    Cell::Text(s.into())
}

fn n(v: f64) -> Cell {
    Cell::Number(v)
}

// -------------------------------------------------------------------------
// Fixture workbooks, shaped like the marketplace exports
// -------------------------------------------------------------------------

const ORGANIC_HEADERS: [&str; 13] = [
    "ID do anúncio",
    "Título",
    "Status",
    "Variação",
    "SKU",
    "Visitas únicas",
    "Qtd. de vendas",
    "Compradores",
    "Unidades vendidas",
    "Vendas brutas (R$)",
    "Participação",
    "Conversão de visitas em vendas",
    "Conversão de visitas em compradores",
];

/// `(id, visits, units_sold)`; conversion is `units / visits`.
fn organic(listings: &[(&str, f64, f64)]) -> WorkbookData {
    let mut rows = vec![
        vec![t("Desempenho de publicações")],
        vec![],
        vec![t("Período")],
        vec![],
        ORGANIC_HEADERS.iter().map(|h| t(h)).collect(),
        // Export artifact: the header repeated as a data row.
        ORGANIC_HEADERS.iter().map(|h| t(h)).collect(),
    ];
    for (id, visits, units) in listings {
        let conv = units / visits;
        rows.push(vec![
            t(&format!("MLB{id}")),
            t("Produto"),
            t("Ativa"),
            Cell::Empty,
            t("SKU"),
            n(*visits),
            n(*units),
            n(*units),
            n(*units),
            n(units * 50.0),
            t("1,5%"),
            n(conv),
            n(conv),
        ]);
    }
    WorkbookData::new(vec![SheetData::new("Publicações", rows)])
}

fn sponsored(ids: &[&str]) -> WorkbookData {
    let mut rows = vec![
        vec![t("Relatório de anúncios patrocinados")],
        vec![
            t("Código do anúncio"),
            t("Impressões"),
            t("Cliques"),
            t("Receita (R$)"),
            t("Investimento (R$)"),
            t("Vendas por publicidade"),
        ],
    ];
    for id in ids {
        rows.push(vec![t(&format!("MLB{id}")), n(1000.0), n(20.0), n(300.0), n(30.0), n(2.0)]);
    }
    WorkbookData::new(vec![
        SheetData::new("Resumo", vec![vec![t("Resumo")]]),
        SheetData::new("Anúncios patrocinados", rows),
    ])
}

/// `(name, date, investment, attributed_sales, cvr)`.
fn campaign_daily(rows: &[(&str, &str, f64, f64, &str)]) -> WorkbookData {
    let mut out = vec![
        vec![t("Relatório de campanhas")],
        vec![
            t("Nome"),
            t("Desde"),
            t("Status"),
            t("Orçamento"),
            t("ACOS objetivo"),
            t("Receita\n(R$)"),
            t("Investimento\n(R$)"),
            t("Vendas por publicidade"),
            t("CVR"),
        ],
    ];
    for (name, date, investment, sales, cvr) in rows {
        out.push(vec![
            t(name),
            t(date),
            t("Ativa"),
            n(50.0),
            t("10%"),
            n(sales * 40.0),
            n(*investment),
            n(*sales),
            t(cvr),
        ]);
    }
    WorkbookData::new(vec![SheetData::new("Campanhas", out)])
}

fn daily_config() -> ReportConfig {
    ReportConfig {
        mode: ReportMode::Daily,
        ..Default::default()
    }
}

// -------------------------------------------------------------------------
// End-to-end scenarios
// -------------------------------------------------------------------------

#[test]
fn campaign_with_spend_and_no_sales_is_paused() {
    let input = ReportInput {
        organic: organic(&[]),
        campaign: campaign_daily(&[
            ("A", "01/03/2024", 50.0, 0.0, "0,5%"),
            ("B", "01/03/2024", 40.0, 5.0, "3%"),
            ("A", "02/03/2024", 60.0, 0.0, "0,5%"),
        ]),
        sponsored: sponsored(&[]),
    };
    let result = run(&daily_config(), &input).unwrap();

    assert_eq!(result.pause.len(), 1);
    let a = &result.pause[0];
    assert_eq!(a.campaign.campaign_name, "A");
    assert_eq!(a.campaign.investment, Some(110.0));
    assert_eq!(a.campaign.attributed_sales, Some(0.0));
    assert!((a.campaign.cvr.unwrap() - 0.005).abs() < 1e-12);
    assert_eq!(a.action, Action::Pause);

    assert_eq!(result.campaigns.len(), 2);
    assert_eq!(result.kpis.investment_total, 150.0);
    assert_eq!(result.kpis.campaigns_unique, 2);
}

#[test]
fn unsponsored_converting_listing_is_promoted() {
    let input = ReportInput {
        organic: organic(&[("123", 80.0, 6.4), ("456", 80.0, 6.4)]),
        campaign: campaign_daily(&[("A", "01/03/2024", 10.0, 1.0, "5%")]),
        sponsored: sponsored(&["456"]),
    };
    let result = run(&daily_config(), &input).unwrap();

    assert_eq!(result.promote.len(), 1);
    let p = &result.promote[0];
    assert_eq!(p.listing.listing_id, "123");
    assert_eq!(p.ad_code, "MLB123");
    assert!((p.listing.conversion_visits_to_sales.unwrap() - 0.08).abs() < 1e-12);
    assert_eq!(p.listing.participation, Some(0.015));
}

#[test]
fn organic_header_artifact_is_filtered_and_ratios_agree() {
    let input = ReportInput {
        organic: organic(&[("1", 100.0, 3.0), ("2", 40.0, 10.0)]),
        campaign: campaign_daily(&[("A", "01/03/2024", 10.0, 1.0, "5%")]),
        sponsored: sponsored(&["1"]),
    };
    let result = run(&daily_config(), &input).unwrap();
    let organic_load = &result.diagnostics.loads[0];
    assert_eq!(organic_load.input, InputKind::Organic);
    assert_eq!(organic_load.rows_kept, 2);
    assert_eq!(organic_load.rows_dropped, 1);

    // Loaded conversion matches units / visits.
    let (listings, _) =
        adsgrid_recon::loaders::load_organic(&input.organic, &ReportConfig::default()).unwrap();
    for l in &listings {
        let derived = l.units_sold.unwrap() / l.visits.unwrap();
        assert!((derived - l.conversion_visits_to_sales.unwrap()).abs() < 1e-9);
    }
}

#[test]
fn missing_campaign_metrics_degrade_and_mark_rules_inactive() {
    let input = ReportInput {
        organic: organic(&[("1", 100.0, 3.0)]),
        campaign: campaign_daily(&[("A", "01/03/2024", 500.0, 0.0, "1%")]),
        sponsored: sponsored(&[]),
    };
    let result = run(&daily_config(), &input).unwrap();
    let campaign_load = &result.diagnostics.loads[1];
    assert!(campaign_load.missing_fields.iter().any(|f| f == "lost_impression_share_budget"));
    assert!(campaign_load.missing_fields.iter().any(|f| f == "roas"));
    assert_eq!(
        result.diagnostics.inactive_rules,
        [Action::ScaleBudget, Action::RaiseAcosTarget]
    );
    assert!(result.scale.is_empty());
    assert_eq!(result.pause.len(), 1);
}

#[test]
fn derived_roas_feeds_the_rules() {
    let config = ReportConfig {
        mode: ReportMode::Daily,
        roas_source: RoasSource::Derived,
        ..Default::default()
    };
    let input = ReportInput {
        organic: organic(&[]),
        campaign: campaign_daily(&[("A", "01/03/2024", 10.0, 2.0, "5%")]),
        sponsored: sponsored(&[]),
    };
    let result = run(&config, &input).unwrap();
    assert_eq!(result.campaigns[0].roas, Some(8.0));
}

#[test]
fn daily_rollup_only_in_daily_mode() {
    let workbook = campaign_daily(&[
        ("A", "02/03/2024", 60.0, 0.0, "0%"),
        ("A", "01/03/2024", 50.0, 0.0, "0%"),
        ("B", "01/03/2024", 40.0, 5.0, "3%"),
    ]);
    let input = ReportInput {
        organic: organic(&[]),
        campaign: workbook,
        sponsored: sponsored(&[]),
    };
    let daily = run(&daily_config(), &input).unwrap().daily.unwrap();
    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].totals.investment, 90.0);
    assert_eq!(daily[1].totals.investment, 60.0);

    let consolidated = run(&ReportConfig::default(), &input).unwrap();
    assert!(consolidated.daily.is_none());
}

#[test]
fn daily_mode_without_date_column_is_fatal() {
    let campaign = WorkbookData::new(vec![SheetData::new(
        "Campanhas",
        vec![vec![], vec![t("Nome"), t("Investimento")], vec![t("A"), n(10.0)]],
    )]);
    let input = ReportInput {
        organic: organic(&[]),
        campaign,
        sponsored: sponsored(&[]),
    };
    let err = run(&daily_config(), &input).unwrap_err();
    assert!(matches!(err, ReportError::MissingColumn { input: InputKind::Campaign, .. }));
    assert!(run(&ReportConfig::default(), &input).is_ok());
}

#[test]
fn result_serializes_with_action_tags() {
    let input = ReportInput {
        organic: organic(&[("123", 80.0, 6.4)]),
        campaign: campaign_daily(&[("A", "01/03/2024", 150.0, 0.0, "0%")]),
        sponsored: sponsored(&[]),
    };
    let result = run(&daily_config(), &input).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["pause"][0]["action"], "PAUSE");
    assert_eq!(json["pause"][0]["campaign_name"], "A");
    assert_eq!(json["promote"][0]["ad_code"], "MLB123");
    assert_eq!(json["meta"]["mode"], "daily");
    assert_eq!(json["daily"][0]["date"], "2024-03-01");
}

// -------------------------------------------------------------------------
// Property tests
// -------------------------------------------------------------------------

mod properties {
    use std::collections::HashSet;

    use adsgrid_recon::aggregate::aggregate_campaigns;
    use adsgrid_recon::classify::evaluate;
    use adsgrid_recon::derived::build_daily_rollup;
    use adsgrid_recon::model::{CampaignAggregate, CampaignRecord, OrganicListing, SponsoredAd};
    use adsgrid_recon::{ReportMode, Thresholds};
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn config() -> ProptestConfig {
        ProptestConfig {
            cases: std::env::var("PROPTEST_CASES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
            failure_persistence: None,
            ..ProptestConfig::default()
        }
    }

    fn opt(range: std::ops::Range<f64>) -> impl Strategy<Value = Option<f64>> {
        prop_oneof![1 => Just(None), 4 => range.prop_map(Some)]
    }

    fn arb_record() -> impl Strategy<Value = CampaignRecord> {
        (
            "[A-E]",
            0u32..20,
            opt(0.0..400.0),
            opt(0.0..10.0),
            opt(0.0..0.1),
            opt(0.0..15.0),
            opt(0.0..60.0),
            opt(0.0..60.0),
        )
            .prop_map(|(name, day, investment, sales, cvr, roas, lost_budget, lost_rank)| CampaignRecord {
                campaign_name: name,
                date: NaiveDate::from_ymd_opt(2024, 3, 1 + day),
                investment,
                attributed_sales: sales,
                cvr,
                roas,
                lost_impression_share_budget: lost_budget,
                lost_impression_share_ranking: lost_rank,
                ..Default::default()
            })
    }

    fn arb_listing() -> impl Strategy<Value = OrganicListing> {
        ("[0-9]{1,3}", opt(0.0..200.0), opt(0.0..0.2)).prop_map(|(id, visits, conv)| OrganicListing {
            listing_id: id,
            title: None,
            status: None,
            variant: None,
            sku: None,
            visits,
            units_sold_qty: None,
            buyers: None,
            units_sold: None,
            gross_sales: None,
            participation: None,
            conversion_visits_to_sales: conv,
            conversion_visits_to_buyers: None,
        })
    }

    fn arb_sponsored() -> impl Strategy<Value = SponsoredAd> {
        proptest::option::of("[0-9]{1,3}").prop_map(|id| SponsoredAd {
            listing_id: id,
            impressions: None,
            clicks: None,
            revenue: None,
            investment: None,
            attributed_sales: None,
        })
    }

    proptest! {
        #![proptest_config(config())]

        #[test]
        fn pause_rows_satisfy_rule_and_are_sorted(records in prop::collection::vec(arb_record(), 0..40)) {
            let t = Thresholds::default();
            let aggs = aggregate_campaigns(&records, ReportMode::Daily);
            let eval = evaluate(&aggs, &[], &[], &t, "MLB");

            for p in &eval.pause {
                let c = &p.campaign;
                prop_assert!(c.investment.unwrap() > t.min_investment_for_pause);
                prop_assert!(
                    c.attributed_sales.is_some_and(|s| s <= 0.0)
                        || c.cvr.is_some_and(|v| v < t.max_cvr_for_pause)
                );
            }
            for w in eval.pause.windows(2) {
                prop_assert!(w[0].campaign.investment >= w[1].campaign.investment);
            }
            let expected = aggs.iter().filter(|c| adsgrid_recon::classify::is_pause(c, &t)).count();
            prop_assert_eq!(eval.pause.len(), expected);
        }

        #[test]
        fn promote_never_contains_sponsored_ids(
            organic in prop::collection::vec(arb_listing(), 0..40),
            ads in prop::collection::vec(arb_sponsored(), 0..40),
        ) {
            let t = Thresholds::default();
            let eval = evaluate(&[], &organic, &ads, &t, "MLB");
            let in_ads: HashSet<&str> = ads.iter().filter_map(|a| a.listing_id.as_deref()).collect();

            for p in &eval.promote {
                prop_assert!(!in_ads.contains(p.listing.listing_id.as_str()));
                prop_assert!(p.listing.visits.unwrap() >= t.min_visits_for_promotion);
                prop_assert!(p.listing.conversion_visits_to_sales.unwrap() > t.min_organic_conversion_for_promotion);
                prop_assert_eq!(&p.ad_code, &format!("MLB{}", p.listing.listing_id));
            }
            for w in eval.promote.windows(2) {
                let (a, b) = (&w[0].listing, &w[1].listing);
                prop_assert!(
                    a.conversion_visits_to_sales > b.conversion_visits_to_sales
                        || (a.conversion_visits_to_sales == b.conversion_visits_to_sales && a.visits >= b.visits)
                );
            }
        }

        #[test]
        fn rollup_conserves_investment(records in prop::collection::vec(arb_record(), 0..60)) {
            let series = build_daily_rollup(&records);
            let raw: f64 = records.iter().filter_map(|r| r.investment).sum();
            let rolled: f64 = series.iter().map(|p| p.totals.investment).sum();
            prop_assert!((raw - rolled).abs() < 1e-6);
            for w in series.windows(2) {
                prop_assert!(w[0].date < w[1].date);
            }
        }

        #[test]
        fn consolidated_aggregation_is_a_fixed_point(records in prop::collection::vec(arb_record(), 0..40)) {
            let once = aggregate_campaigns(&records, ReportMode::Daily);
            let as_records: Vec<CampaignRecord> = once.iter().map(CampaignAggregate::to_record).collect();
            let first = aggregate_campaigns(&as_records, ReportMode::Consolidated);
            let again: Vec<CampaignRecord> = first.iter().map(CampaignAggregate::to_record).collect();
            let second = aggregate_campaigns(&again, ReportMode::Consolidated);
            prop_assert_eq!(&first, &once);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn aggregate_names_are_unique(records in prop::collection::vec(arb_record(), 0..40)) {
            let aggs = aggregate_campaigns(&records, ReportMode::Daily);
            let names: HashSet<&str> = aggs.iter().map(|a| a.campaign_name.as_str()).collect();
            prop_assert_eq!(names.len(), aggs.len());
        }
    }
}
