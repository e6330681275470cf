//! Report queries and post-processing over canned rows

use salesboard::db::{CellValue, ConnectionManager, RetryPolicy, SqlParam};
use salesboard::reports::YearFilter;
use salesboard::reports::objectives::{self, Evolution, ObjectiveFilter, Projection};
use salesboard::reports::revenue::{self, CountryFilter, VendorFilter};
use salesboard::reports::salespeople::{self, SalespersonFilter};
use salesboard::reports::order_reasons::{self, ReasonFilter};

use crate::common::{MockConnector, rows, text};

fn db(connector: &MockConnector) -> ConnectionManager<MockConnector> {
    ConnectionManager::new(connector.clone(), RetryPolicy::default())
}

#[tokio::test]
async fn test_revenue_by_country_normalizes_amounts() {
    let connector = MockConnector::new().returning(rows(
        &["country", "year", "revenue"],
        vec![
            vec![text("FR"), CellValue::Integer(2024), text("1 250,50")],
            vec![text("DE"), CellValue::Integer(2024), CellValue::Null],
            vec![text("IT"), CellValue::Integer(2024), text("n/a")],
        ],
    ));
    let db = db(&connector);

    let filter = CountryFilter {
        country: None,
        year: YearFilter::Year(2024),
    };
    let result = revenue::by_country(&db, &filter).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result[0].country.as_deref(), Some("FR"));
    assert_eq!(result[0].revenue, 1250.5);
    assert_eq!(result[1].revenue, 0.0);
    assert_eq!(result[2].revenue, 0.0);

    let query = connector.last_query();
    assert!(query.sql.ends_with("WHERE 1=1 AND year = @param0"));
    assert_eq!(query.params, vec![SqlParam::Int(2024)]);
}

#[tokio::test]
async fn test_revenue_filters_in_declared_order() {
    let connector = MockConnector::new();
    let db = db(&connector);

    let filter = VendorFilter {
        vendor_group: Some("12".into()),
        year: YearFilter::Year(2023),
    };
    revenue::by_vendor(&db, &filter).await.unwrap();

    let query = connector.last_query();
    assert!(
        query
            .sql
            .ends_with("AND vendor_group = @param0 AND year = @param1")
    );
    assert_eq!(
        query.params,
        vec![SqlParam::Text("12".into()), SqlParam::Int(2023)]
    );
}

#[tokio::test]
async fn test_blank_filters_are_ignored() {
    let connector = MockConnector::new();
    let db = db(&connector);

    let filter = SalespersonFilter {
        salesperson: Some("   ".into()),
        year: YearFilter::All,
    };
    salespeople::order_share(&db, &filter).await.unwrap();

    let query = connector.last_query();
    assert!(query.sql.ends_with("WHERE 1=1"));
    assert!(query.params.is_empty());
}

#[tokio::test]
async fn test_total_revenue_sums_every_row() {
    let connector = MockConnector::new().returning(rows(
        &["year", "revenue"],
        vec![
            vec![CellValue::Integer(2024), text("100,25")],
            vec![CellValue::Integer(2024), CellValue::Float(50.0)],
            vec![CellValue::Integer(2024), text("")],
        ],
    ));
    let db = db(&connector);

    let total = revenue::total(&db, YearFilter::Year(2024)).await.unwrap();
    assert_eq!(total.total_revenue, 150.25);
}

#[tokio::test]
async fn test_conversion_times_order_and_filter() {
    let connector = MockConnector::new();
    let db = db(&connector);

    salespeople::conversion_times(&db, Some("7")).await.unwrap();

    let query = connector.last_query();
    assert!(
        query
            .sql
            .ends_with("AND c.salesperson = @param0 ORDER BY c.conversions DESC")
    );
    assert_eq!(query.params, vec![SqlParam::Text("7".into())]);
}

#[tokio::test]
async fn test_order_reason_share_passes_rows_through() {
    let connector = MockConnector::new().returning(rows(
        &["year", "reason", "share"],
        vec![vec![
            CellValue::Integer(2024),
            text("Price"),
            CellValue::Float(0.4),
        ]],
    ));
    let db = db(&connector);

    let filter = ReasonFilter {
        year: YearFilter::Year(2024),
        reason: Some("Price".into()),
    };
    let rows = order_reasons::share(&db, &filter).await.unwrap();

    assert_eq!(
        rows,
        vec![serde_json::json!({"year": 2024, "reason": "Price", "share": 0.4})]
    );
    assert_eq!(
        connector.last_query().params,
        vec![SqlParam::Int(2024), SqlParam::Text("Price".into())]
    );
}

#[tokio::test]
async fn test_completion_rates() {
    let connector = MockConnector::new().returning(rows(
        &["year", "vendor_group", "salesperson_name", "objective", "revenue"],
        vec![
            vec![CellValue::Integer(2024), text("1"), text("Ada"), text("200"), text("50")],
            vec![CellValue::Integer(2024), text("2"), text("Bob"), text("0"), text("80")],
            vec![CellValue::Integer(2024), text("3"), text("Cy"), text("-100"), text("25")],
        ],
    ));
    let db = db(&connector);

    let rows = objectives::completion(&db, &ObjectiveFilter::default())
        .await
        .unwrap();
    let rates: Vec<f64> = rows.iter().map(|r| r.completion_rate).collect();
    assert_eq!(rates, vec![25.0, 0.0, 75.0]);
    assert_eq!(rows[0].objective.salesperson_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_projection_extrapolates_to_twelve_months() {
    let connector = MockConnector::new().returning(rows(
        &["revenue", "objective", "salesperson_name"],
        vec![vec![text("300"), text("1000"), text("Ada")]],
    ));
    let db = db(&connector);

    let projection = objectives::projection(&db, "1", YearFilter::Year(2024), 3)
        .await
        .unwrap();
    assert_eq!(
        projection,
        Projection::Estimate {
            revenue: 300.0,
            objective: 1000.0,
            projected_revenue: 1200.0,
            salesperson_name: Some("Ada".into()),
        }
    );
    assert_eq!(
        connector.last_query().params,
        vec![SqlParam::Text("1".into()), SqlParam::Int(2024)]
    );
}

#[tokio::test]
async fn test_projection_without_data_or_year() {
    let connector = MockConnector::new();
    let db = db(&connector);

    let missing = objectives::projection(&db, "1", YearFilter::Year(2024), 6)
        .await
        .unwrap();
    assert!(matches!(missing, Projection::Unavailable { .. }));

    let all_years = objectives::projection(&db, "1", YearFilter::All, 6)
        .await
        .unwrap();
    assert!(matches!(all_years, Projection::Unavailable { .. }));
    // "all" is answered without a query
    assert_eq!(connector.queries().len(), 1);
}

#[tokio::test]
async fn test_evolution_totals_sorted_by_year() {
    let connector = MockConnector::new().returning(rows(
        &["year", "vendor_group", "salesperson_name", "objective", "revenue"],
        vec![
            vec![CellValue::Integer(2024), text("1"), text("Ada"), text("100"), text("40")],
            vec![CellValue::Integer(2023), text("1"), text("Ada"), text("90"), text("95")],
            vec![CellValue::Integer(2024), text("2"), text("Bob"), text("50"), text("10")],
        ],
    ));
    let db = db(&connector);

    let Evolution::Totals(totals) = objectives::evolution(&db, None).await.unwrap() else {
        panic!("expected per-year totals");
    };
    let summary: Vec<(i64, f64, f64)> = totals
        .iter()
        .map(|t| (t.year, t.revenue_total, t.objective_total))
        .collect();
    assert_eq!(summary, vec![(2023, 95.0, 90.0), (2024, 50.0, 150.0)]);
}

#[tokio::test]
async fn test_evolution_for_one_group() {
    let connector = MockConnector::new().returning(rows(
        &["year", "vendor_group", "salesperson_name", "objective", "revenue"],
        vec![vec![CellValue::Integer(2023), text("1"), text("Ada"), text("90"), text("95")]],
    ));
    let db = db(&connector);

    let evolution = objectives::evolution(&db, Some("1")).await.unwrap();
    assert!(matches!(evolution, Evolution::Group(ref rows) if rows.len() == 1));

    let query = connector.last_query();
    assert!(query.sql.ends_with("AND o.vendor_group = @param0 ORDER BY o.year"));
}
