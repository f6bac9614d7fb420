use sales_report::diagnostics::NullSink;
use sales_report::loader::read_csv;
use sales_report::output::{export, ExportFormat};
use sales_report::{Category, ColumnOverrides, Config, Dataset, Engine, EventLog};

fn load(csv: &str) -> Dataset {
    read_csv(csv.as_bytes()).unwrap().0
}

const SCENARIO: &str = "\
Item Name,Item Cost,Quantity
Men's Polo Shirt,500,3
Classic T-Shirt,350,10
Full Sleeve T-Shirt,450,-2
";

#[test]
fn end_to_end_scenario() {
    let ds = load(SCENARIO);
    let engine = Engine::new(Config::default());
    let mut log = EventLog::new();
    let tables = engine.run(&ds, &ColumnOverrides::default(), &mut log).unwrap();

    let mut categories: Vec<Category> = tables.summary.iter().map(|r| r.category).collect();
    categories.sort();
    let mut expected = vec![Category::Polo, Category::HsTShirt, Category::FsTShirt];
    expected.sort();
    assert_eq!(categories, expected);

    let fs = tables
        .summary
        .iter()
        .find(|r| r.category == Category::FsTShirt)
        .unwrap();
    assert_eq!(fs.total_quantity, 0.0);
    assert_eq!(fs.total_amount, 0.0);

    assert_eq!(tables.stats.total_revenue, 5000.0);
    assert_eq!(tables.stats.total_quantity, 13.0);
    assert_eq!(tables.stats.data_quality.negative_quantities, 1);
    assert_eq!(log.count("data_quality"), 1);
    assert_eq!(tables.stats.timeframe, "");
    assert_eq!(tables.file_stem(), "Sales_Report");
}

const MIXED: &str = "\
Product,Unit Price,Qty Sold,Order Date
Men's Polo Shirt,500,3,2024-03-02
Classic T-Shirt,350,10,2024-03-05
Classic T-Shirt,350,4,2024-03-09
classic t-shirt,300,1,2024-03-10
Formal Shirt,\"1,200\",2,2024-03-12
Long Sleeve Shirt,abc,5,2024-03-15
Leather Belt,800,-1,not a date
Gift Voucher,1000,1,2024-03-31
,250,2,2024-03-20
";

#[test]
fn views_agree_on_totals() {
    let ds = load(MIXED);
    let engine = Engine::new(Config::default());
    let tables = engine
        .run(&ds, &ColumnOverrides::default(), &mut NullSink)
        .unwrap();

    // 1500 + 3500 + 1400 + 300 + 2400 + 0 + 0 + 1000 + 500
    let expected = 10_600.0;
    let summary: f64 = tables.summary.iter().map(|r| r.total_amount).sum();
    let drill: f64 = tables.drilldown.iter().map(|r| r.total_amount).sum();
    let top: f64 = tables.top_products.iter().map(|r| r.total_amount).sum();
    assert!((summary - expected).abs() < 1e-6, "{summary}");
    assert!((drill - expected).abs() < 1e-6, "{drill}");
    assert!((top - expected).abs() < 1e-6, "{top}");

    let rev_share: f64 = tables.summary.iter().map(|r| r.revenue_share_pct).sum();
    assert!((rev_share - 100.0).abs() <= 0.05, "{rev_share}");
    let qty_share: f64 = tables.summary.iter().map(|r| r.quantity_share_pct).sum();
    assert!((qty_share - 100.0).abs() <= 0.05, "{qty_share}");

    for r in &tables.drilldown {
        assert_eq!(r.total_amount, r.price * r.total_quantity);
    }
}

#[test]
fn mixed_dataset_details() {
    let ds = load(MIXED);
    let engine = Engine::new(Config::default());
    let mut log = EventLog::new();
    let tables = engine.run(&ds, &ColumnOverrides::default(), &mut log).unwrap();

    let q = &tables.stats.data_quality;
    assert_eq!(q.invalid_numbers, 1);
    assert_eq!(q.negative_quantities, 1);
    assert_eq!(q.invalid_dates, 1);
    assert_eq!(q.missing_names, 1);
    assert_eq!(tables.stats.timeframe, "March_2024");

    // differently-cased spellings stay separate products
    let names: Vec<&str> = tables
        .top_products
        .iter()
        .map(|r| r.product_name.as_str())
        .collect();
    assert!(names.contains(&"Classic T-Shirt"));
    assert!(names.contains(&"classic t-shirt"));
    assert_eq!(names[0], "Classic T-Shirt");

    // HS T-Shirt drilldown has separate 300 and 350 price points, in order
    let tees: Vec<f64> = tables
        .drilldown
        .iter()
        .filter(|r| r.category == Category::HsTShirt)
        .map(|r| r.price)
        .collect();
    assert_eq!(tees, vec![300.0, 350.0]);

    // summary ordered by label
    let labels: Vec<&str> = tables.summary.iter().map(|r| r.category.as_str()).collect();
    let mut sorted = labels.clone();
    sorted.sort();
    assert_eq!(labels, sorted);

    // placeholder row and the voucher are both uncategorized
    assert_eq!(tables.stats.uncategorized_rows, 2);
    assert_eq!(log.count("uncategorized_batch"), 1);
}

#[test]
fn runs_are_idempotent() {
    let ds = load(MIXED);
    let engine = Engine::new(Config::default());
    let a = engine
        .run(&ds, &ColumnOverrides::default(), &mut NullSink)
        .unwrap();
    let b = engine
        .run(&ds, &ColumnOverrides::default(), &mut NullSink)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );

    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let files_a = export(&a, dir_a.path(), ExportFormat::Csv).unwrap();
    let files_b = export(&b, dir_b.path(), ExportFormat::Csv).unwrap();
    for (fa, fb) in files_a.iter().zip(&files_b) {
        assert_eq!(std::fs::read(fa).unwrap(), std::fs::read(fb).unwrap());
    }
}

#[test]
fn manual_column_selection() {
    let ds = load("Article,Amt,Pieces\nDenim Jacket,1500,2\n");
    let engine = Engine::new(Config::default());
    let err = engine
        .run(&ds, &ColumnOverrides::default(), &mut NullSink)
        .unwrap_err();
    assert!(err.is_configuration());

    let overrides = ColumnOverrides {
        name: Some("Article".into()),
        cost: Some("Amt".into()),
        quantity: Some("Pieces".into()),
        date: None,
    };
    let tables = engine.run(&ds, &overrides, &mut NullSink).unwrap();
    assert_eq!(tables.summary.len(), 1);
    assert_eq!(tables.summary[0].category, Category::Denim);
    assert_eq!(tables.summary[0].total_amount, 3000.0);
}

#[test]
fn custom_rules_from_config() {
    let config = Config::from_toml(
        r#"
top_products_limit = 1

[classifier]
rules = [
  { label = "Jacket", keywords = ["jacket"] },
  { label = "Denim", keywords = ["denim"] },
]
"#,
    )
    .unwrap();
    let ds = load("Item Name,Item Cost,Quantity\nDenim Jacket,1500,2\nPlain Tee,300,1\n");
    let engine = Engine::new(config);
    let tables = engine
        .run(&ds, &ColumnOverrides::default(), &mut NullSink)
        .unwrap();
    assert_eq!(tables.top_products.len(), 1);
    assert_eq!(tables.top_products[0].category, Category::Jacket);
}

#[test]
fn spanning_dates_label_the_export() {
    let ds = load(
        "Item Name,Item Cost,Quantity,Date\n\
         Kaftan,900,1,05/03/2024\n\
         Wallet,400,2,20/04/2024\n",
    );
    let engine = Engine::new(Config::default());
    let tables = engine
        .run(&ds, &ColumnOverrides::default(), &mut NullSink)
        .unwrap();
    assert_eq!(tables.stats.timeframe, "05Mar_to_20Apr_24");

    let dir = tempfile::tempdir().unwrap();
    let files = export(&tables, dir.path(), ExportFormat::Xlsx).unwrap();
    assert!(files[0].ends_with("Sales_Report_05Mar_to_20Apr_24.xlsx"));
    assert!(files[0].exists());
}
