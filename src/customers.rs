use chrono::{Days, NaiveDate};
use phf_macros::phf_ordered_map;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::fields::{FieldMap, FieldSpec, FieldType, FieldValue, Record};
use crate::source::SqlRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub city: String,
    pub state: String,
    pub signup_date: NaiveDate,
    pub active: bool,
}

mod get {
    use super::Customer;
    use crate::fields::FieldValue;

    pub fn customer_id(c: &Customer) -> FieldValue<'_> {
        FieldValue::Int(c.customer_id)
    }
    pub fn first_name(c: &Customer) -> FieldValue<'_> {
        FieldValue::Text(&c.first_name)
    }
    pub fn last_name(c: &Customer) -> FieldValue<'_> {
        FieldValue::Text(&c.last_name)
    }
    pub fn email(c: &Customer) -> FieldValue<'_> {
        c.email.as_deref().map_or(FieldValue::Null, FieldValue::Text)
    }
    pub fn city(c: &Customer) -> FieldValue<'_> {
        FieldValue::Text(&c.city)
    }
    pub fn state(c: &Customer) -> FieldValue<'_> {
        FieldValue::Text(&c.state)
    }
    pub fn signup_date(c: &Customer) -> FieldValue<'_> {
        FieldValue::Date(c.signup_date)
    }
    pub fn active(c: &Customer) -> FieldValue<'_> {
        FieldValue::Bool(c.active)
    }
}

pub static CUSTOMER_FIELDS: FieldMap<Customer> = phf_ordered_map! {
    "customer_id" => FieldSpec::new("customer_id", FieldType::Int, get::customer_id),
    "first_name" => FieldSpec::new("first_name", FieldType::Text, get::first_name),
    "last_name" => FieldSpec::new("last_name", FieldType::Text, get::last_name),
    "email" => FieldSpec::new("email", FieldType::Text, get::email),
    "city" => FieldSpec::new("city", FieldType::Text, get::city),
    "state" => FieldSpec::new("state", FieldType::Text, get::state),
    "signup_date" => FieldSpec::new("signup_date", FieldType::Date, get::signup_date),
    "active" => FieldSpec::new("active", FieldType::Bool, get::active),
};

impl Record for Customer {
    const NAME: &'static str = "Customer";

    fn fields() -> &'static FieldMap<Self> {
        &CUSTOMER_FIELDS
    }
}

impl SqlRecord for Customer {
    const TABLE: &'static str = "customers";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Customer {
            customer_id: row.get("customer_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            city: row.get("city")?,
            state: row.get("state")?,
            signup_date: row.get("signup_date")?,
            active: row.get("active")?,
        })
    }
}

pub const CREATE_CUSTOMERS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS customers (
    customer_id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    signup_date TEXT NOT NULL,
    active INTEGER NOT NULL
);"#;

const FIRST_NAMES: [&str; 12] = [
    "Ada", "Bruno", "Carmen", "Dmitri", "Elena", "Farah", "Gus", "Hana", "Ivan", "Jade", "Kofi",
    "Lena",
];

const LAST_NAMES: [&str; 9] = [
    "Okafor", "Lindqvist", "Moreau", "Tanaka", "Reyes", "Novak", "Brennan", "Haddad", "Silva",
];

const CITIES: [(&str, &str); 10] = [
    ("Austin", "TX"),
    ("Portland", "OR"),
    ("Denver", "CO"),
    ("Boston", "MA"),
    ("Raleigh", "NC"),
    ("Tucson", "AZ"),
    ("Madison", "WI"),
    ("Boise", "ID"),
    ("Dallas", "TX"),
    ("Salem", "OR"),
];

/// Deterministic demo rows with ids `1..=count`.
pub fn demo_customers(count: usize) -> Vec<Customer> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();

    (0..count)
        .map(|i| {
            let first = FIRST_NAMES[i % FIRST_NAMES.len()];
            let last = LAST_NAMES[(i / FIRST_NAMES.len() + i) % LAST_NAMES.len()];
            let (city, state) = CITIES[i % CITIES.len()];
            let signup_date = base
                .checked_add_days(Days::new((i as u64 * 37) % 1500))
                .unwrap_or(base);

            Customer {
                customer_id: i as i64 + 1,
                first_name: first.to_owned(),
                last_name: last.to_owned(),
                // Every seventh customer has no email on file
                email: (i % 7 != 6).then(|| {
                    format!("{}.{}{}@example.com", first, last, i + 1).to_lowercase()
                }),
                city: city.to_owned(),
                state: state.to_owned(),
                signup_date,
                active: i % 4 != 3,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_types() {
        let names: Vec<&str> = Customer::fields().keys().copied().collect();
        assert_eq!(
            names,
            vec![
                "customer_id",
                "first_name",
                "last_name",
                "email",
                "city",
                "state",
                "signup_date",
                "active"
            ]
        );
        assert_eq!(Customer::field("city").unwrap().field_type, FieldType::Text);
        assert_eq!(
            Customer::field("signup_date").unwrap().field_type,
            FieldType::Date
        );
        assert!(Customer::field("City").is_none());
        assert!(Customer::field("balance").is_none());
    }

    #[test]
    fn test_getters_read_the_right_field() {
        let c = &demo_customers(7)[6];
        assert_eq!(Customer::field("city").unwrap().get(c), FieldValue::Text("Madison"));
        assert_eq!(Customer::field("customer_id").unwrap().get(c), FieldValue::Int(7));
        assert_eq!(Customer::field("email").unwrap().get(c), FieldValue::Null);
        assert_eq!(Customer::field("active").unwrap().get(c), FieldValue::Bool(true));
    }

    #[test]
    fn test_demo_customers_deterministic() {
        let a = demo_customers(50);
        let b = demo_customers(50);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert_eq!(a[0].customer_id, 1);
        assert_eq!(a[49].customer_id, 50);
        assert_eq!(a.iter().filter(|c| c.city == "Austin").count(), 5);
    }
}
