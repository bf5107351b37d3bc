//! End-to-end session runs against an in-memory SQLite store.

use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tax_cli::app;
use tax_cli::prompt::Prompter;
use tax_cli::{AppConfig, Overrides, SessionConfig, TaxSession};
use tax_core::calculations::IncomeTaxCalculator;
use tax_core::{Filter, Person};

fn person(
    name: &str,
    born: (i32, u32, u32),
    salary: rust_decimal::Decimal,
) -> Person {
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    let born = NaiveDate::from_ymd_opt(born.0, born.1, born.2).unwrap();
    Person::new(name, "Test", born, salary, today).unwrap()
}

async fn sqlite_clients() -> app::Clients {
    let mut config = AppConfig::default();
    config.apply(Overrides {
        connection_string: Some(":memory:".to_string()),
        ..Overrides::default()
    });
    config.validate().unwrap();

    let clients = app::connect(
        &app::build_registry(),
        &config.db_config(),
        config.tax_card_collection(),
    )
    .await
    .expect("in-memory SQLite should connect");

    let people = vec![
        person("Ona", (1990, 6, 16), dec!(30000.00)),
        person("Jonas", (1980, 1, 1), dec!(1000.02)),
        person("Rasa", (2000, 2, 29), dec!(98765.43)),
    ];
    let docs = people.iter().map(|p| p.to_document().unwrap()).collect();
    clients.people.insert_many(docs).await.unwrap();
    clients
}

#[tokio::test]
async fn selecting_a_person_prints_and_stores_the_tax_card() {
    let clients = sqlite_clients().await;
    let reader = clients.people.sibling("tax_cards");
    let config = SessionConfig {
        pause: Duration::ZERO,
        initial_range: None,
    };
    let prompter = Prompter::new("30\n50\n2\n".as_bytes(), Vec::new());
    let mut session = TaxSession::new(
        clients.people,
        IncomeTaxCalculator::default(),
        config,
        prompter,
    )
    .with_tax_cards(clients.tax_cards.expect("tax cards are on by default"));

    session.run().await.unwrap();
    let output = String::from_utf8(session.into_output()).unwrap();

    assert!(output.contains("1. Ona Test, age 33\n2. Jonas Test, age 44\n"));
    assert!(output.contains("Tax Paid: 335.01 EUR"));
    assert!(output.contains("Take Home Pay: 665.01 EUR"));

    let cards = reader.find(&Filter::all(), None).await.into_documents();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["name"], "Jonas");
    assert_eq!(cards[0]["tax_paid"], 335.01);
}

#[tokio::test]
async fn prefilled_range_from_overrides() {
    let clients = sqlite_clients().await;
    let mut config = AppConfig::default();
    config.apply(Overrides {
        min_age: Some(18),
        max_age: Some(25),
        pause_ms: Some(0),
        ..Overrides::default()
    });
    let session_config = SessionConfig {
        pause: config.pause(),
        initial_range: config.initial_range(),
    };
    let prompter = Prompter::new("1\n".as_bytes(), Vec::new());
    let mut session = TaxSession::new(
        clients.people,
        IncomeTaxCalculator::new(config.tax.clone()),
        session_config,
        prompter,
    );

    session.run().await.unwrap();
    let output = String::from_utf8(session.into_output()).unwrap();

    assert!(output.contains("1. Rasa Test, age 24\n"));
    // 98765.43 * 0.335 = 33086.41905
    assert!(output.contains("Tax Paid: 33086.42 EUR"));
    assert!(output.contains("Take Home Pay: 65679.01 EUR"));
}
