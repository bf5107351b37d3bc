use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::IncomeTaxResult;
use crate::db::{Document, DocumentId, StoreError, document};
use crate::models::Person;

/// Tax outcome for one person, written once to the tax-card collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxCard {
    /// `_id` of the person document the card was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<DocumentId>,
    pub name: String,
    pub surname: String,
    pub age: u32,
    #[serde(rename = "anual_salary_before_tax", with = "crate::models::money")]
    pub annual_salary_before_tax: Decimal,
    #[serde(with = "crate::models::money")]
    pub tax_paid: Decimal,
    #[serde(with = "crate::models::money")]
    pub take_home_pay: Decimal,
}

impl TaxCard {
    pub fn issue(
        person: &Person,
        person_id: Option<DocumentId>,
        result: &IncomeTaxResult,
    ) -> Self {
        Self {
            person_id,
            name: person.name.clone(),
            surname: person.surname.clone(),
            age: person.age,
            annual_salary_before_tax: person.annual_salary_before_tax,
            tax_paid: result.tax_paid,
            take_home_pay: result.take_home_pay,
        }
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        document::to_document(self)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::calculations::IncomeTaxCalculator;

    fn person() -> Person {
        let born = NaiveDate::from_ymd_opt(1985, 2, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        Person::new("Tomas", "Jonaitis", born, dec!(30000.00), today).unwrap()
    }

    #[test]
    fn issue_copies_person_and_tax_fields() {
        let person = person();
        let result = IncomeTaxCalculator::default()
            .calculate(person.annual_salary_before_tax)
            .unwrap();

        let card = TaxCard::issue(&person, Some(DocumentId(12)), &result);

        assert_eq!(card.person_id, Some(DocumentId(12)));
        assert_eq!(card.age, 39);
        assert_eq!(card.tax_paid, dec!(10050.00));
        assert_eq!(card.take_home_pay, dec!(19950.00));
    }

    #[test]
    fn document_shape() {
        let person = person();
        let result = IncomeTaxCalculator::default()
            .calculate(person.annual_salary_before_tax)
            .unwrap();

        let doc = TaxCard::issue(&person, Some(DocumentId(3)), &result)
            .to_document()
            .unwrap();

        assert_eq!(
            serde_json::Value::Object(doc),
            json!({
                "person_id": 3,
                "name": "Tomas",
                "surname": "Jonaitis",
                "age": 39,
                "anual_salary_before_tax": 30000.0,
                "tax_paid": 10050.0,
                "take_home_pay": 19950.0,
            })
        );
    }

    #[test]
    fn document_without_person_id_omits_the_key() {
        let person = person();
        let result = IncomeTaxCalculator::default().calculate(dec!(30000)).unwrap();

        let doc = TaxCard::issue(&person, None, &result).to_document().unwrap();

        assert!(!doc.contains_key("person_id"));
    }
}
