//! Record assembly
//!
//! The assembler runs every detector over the merged input text, applies the
//! per-field multiplicity rules (first-match-wins scalars, positional dates),
//! probes field memory's registered custom fields, and builds one
//! `ExtractionRecord`. Its only side effect is the `observe` call that feeds
//! field memory; everything else is a pure function of the text.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::extract::patterns::{MoneyBucket, PatternLibrary};
use crate::extract::record::{fields, ExtractionRecord, FieldValue};
use crate::memory::fields::FieldMemory;

/// Builds one record per extraction pass.
pub struct RecordAssembler {
    library: PatternLibrary,
    memory: Arc<FieldMemory>,
}

impl RecordAssembler {
    pub fn new(config: &ExtractorConfig, memory: Arc<FieldMemory>) -> Result<Self> {
        Ok(Self {
            library: PatternLibrary::new(config)?,
            memory,
        })
    }

    /// Run one extraction pass over `text`.
    ///
    /// Detectors that find nothing leave their field absent. Empty text is
    /// valid input and yields a record holding only the trailing timestamp.
    pub async fn assemble(&self, text: &str) -> Result<ExtractionRecord> {
        let mut record = ExtractionRecord::new();

        record.insert_non_empty(
            fields::PERSONS,
            FieldValue::list_of(self.library.persons(text)),
        );
        record.insert_non_empty(fields::PERSONAL_DETAILS, self.personal_details(text));

        let addresses = self.library.address_lines(text);
        if !addresses.is_empty() {
            let mut address = FieldValue::group();
            address.group_insert(fields::ADDRESS_RAW, FieldValue::list_of(addresses));
            record.insert(fields::ADDRESS, address);
        }

        record.insert_non_empty(
            fields::PHONE,
            FieldValue::list_of(self.library.phones(text)),
        );
        record.insert_non_empty(
            fields::EMAIL,
            FieldValue::list_of(self.library.emails(text)),
        );

        let (salary, amount) = self.money_buckets(text);
        record.insert_non_empty(fields::SALARY, FieldValue::list_of(salary));
        record.insert_non_empty(fields::AMOUNT, FieldValue::list_of(amount));

        record.insert_non_empty(fields::DATES, self.positional_dates(text));

        // First match wins for the singular fields
        if let Some(pincode) = self.library.pincodes(text).into_iter().next() {
            record.insert(fields::PINCODE, FieldValue::text(pincode));
        }

        let mut txn = FieldValue::group();
        if let Some(reference) = self.library.transaction_refs(text).into_iter().next() {
            txn.group_insert(fields::TXN_REFERENCE, FieldValue::text(reference));
        }
        if self.library.mentions_cash(text) {
            txn.group_insert(fields::TXN_MODE, FieldValue::text("Cash"));
        }
        record.insert_non_empty(fields::TRANSACTION, txn);

        let products: Vec<FieldValue> = self
            .library
            .products(text)
            .into_iter()
            .map(|p| {
                let mut group = FieldValue::group();
                group.group_insert(fields::PRODUCT_NAME, FieldValue::text(p.name));
                group.group_insert(fields::PRODUCT_QUANTITY, FieldValue::text(p.quantity));
                group.group_insert(fields::PRODUCT_PRICE, FieldValue::text(p.price));
                group
            })
            .collect();
        record.insert_non_empty(fields::PRODUCTS, FieldValue::List(products));

        record.insert_non_empty(fields::NOTES, FieldValue::list_of(self.library.notes(text)));

        // Runtime-registered fields, probed by keyword adjacency
        for name in self.memory.custom_fields().await {
            if let Some(value) = self.library.custom_field(text, &name)? {
                record.insert(name, FieldValue::text(value));
            }
        }

        self.observe(&record).await?;
        record.stamp();

        debug!(fields = record.len(), "assembled extraction record");
        Ok(record)
    }

    fn personal_details(&self, text: &str) -> FieldValue {
        let mut details: IndexMap<String, FieldValue> = IndexMap::new();
        for (name, age) in self.library.ages(text) {
            details
                .entry(name)
                .or_insert_with(FieldValue::group)
                .group_insert(fields::DETAIL_AGE, FieldValue::text(age));
        }
        for (name, gender) in self.library.genders(text) {
            details
                .entry(name)
                .or_insert_with(FieldValue::group)
                .group_insert(fields::DETAIL_GENDER, FieldValue::text(gender));
        }
        FieldValue::Group(details)
    }

    fn money_buckets(&self, text: &str) -> (Vec<String>, Vec<String>) {
        let mut salary = Vec::new();
        let mut amount = Vec::new();
        for token in self.library.monetary(text) {
            match self.library.classify_money(&token) {
                MoneyBucket::Salary => salary.push(token),
                MoneyBucket::Amount => amount.push(token),
            }
        }
        (salary, amount)
    }

    fn positional_dates(&self, text: &str) -> FieldValue {
        let mut group = FieldValue::group();
        let mut dates = self.library.dates(text).into_iter();
        if let Some(primary) = dates.next() {
            group.group_insert(fields::DATE_PRIMARY, FieldValue::text(primary));
        }
        if let Some(secondary) = dates.next() {
            group.group_insert(fields::DATE_SECONDARY, FieldValue::text(secondary));
        }
        let rest: Vec<String> = dates.collect();
        if !rest.is_empty() {
            group.group_insert(fields::DATE_ADDITIONAL, FieldValue::list_of(rest));
        }
        group
    }

    /// Report the populated field names and their sample values to field
    /// memory. Runs before the timestamp is appended, so bookkeeping fields
    /// are not counted as learned vocabulary.
    async fn observe(&self, record: &ExtractionRecord) -> Result<()> {
        for (name, value) in record.iter() {
            let mut samples = Vec::new();
            value.leaf_samples(&mut samples);
            self.memory.observe(name, &samples).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::record::builtin_fields;

    fn assembler() -> (RecordAssembler, Arc<FieldMemory>) {
        let memory = Arc::new(FieldMemory::with_defaults());
        let assembler =
            RecordAssembler::new(&ExtractorConfig::default(), Arc::clone(&memory)).unwrap();
        (assembler, memory)
    }

    fn text_list(value: &FieldValue) -> Vec<&str> {
        value
            .as_list()
            .unwrap()
            .iter()
            .filter_map(FieldValue::as_text)
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let (assembler, _) = assembler();
        let record = assembler
            .assemble(
                "Ramesh Kumar is 34 years old, phone 9876543210, salary is 25000, \
                 meeting on 01/02/2024",
            )
            .await
            .unwrap();

        assert_eq!(text_list(record.get("Persons").unwrap()), vec!["Ramesh Kumar"]);
        assert_eq!(text_list(record.get("Phone").unwrap()), vec!["9876543210"]);
        assert_eq!(text_list(record.get("Salary").unwrap()), vec!["25000"]);

        let dates = record.get("Dates").unwrap().as_group().unwrap();
        assert_eq!(dates["primary"].as_text(), Some("01/02/2024"));
        assert!(!dates.contains_key("secondary"));

        let details = record.get("PersonalDetails").unwrap().as_group().unwrap();
        let ramesh = details["Ramesh Kumar"].as_group().unwrap();
        assert_eq!(ramesh["Age"].as_text(), Some("34"));

        assert_eq!(record.field_names().last(), Some("timestamp"));
    }

    #[tokio::test]
    async fn test_idempotent_except_timestamp() {
        let (assembler, _) = assembler();
        let text = "Priya Sharma, phone 9123456780, salary is 50000, meet 05/06/2024";

        let first = assembler.assemble(text).await.unwrap();
        let second = assembler.assemble(text).await.unwrap();

        let strip = |r: &ExtractionRecord| -> Vec<(String, FieldValue)> {
            r.iter()
                .filter(|(name, _)| *name != fields::TIMESTAMP)
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect()
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[tokio::test]
    async fn test_empty_text_yields_timestamp_only() {
        let (assembler, memory) = assembler();
        let record = assembler.assemble("").await.unwrap();

        assert_eq!(record.len(), 1);
        assert!(record.contains("timestamp"));
        assert!(memory.is_empty().await);
    }

    #[tokio::test]
    async fn test_threshold_routes_buckets() {
        let (assembler, _) = assembler();

        let record = assembler.assemble("salary is 10000 agreed").await.unwrap();
        assert!(record.get("Salary").is_none());
        assert_eq!(text_list(record.get("Amount").unwrap()), vec!["10000"]);

        let record = assembler.assemble("salary is 10001 agreed").await.unwrap();
        assert_eq!(text_list(record.get("Salary").unwrap()), vec!["10001"]);
        assert!(record.get("Amount").is_none());
    }

    #[tokio::test]
    async fn test_dates_overflow_to_additional() {
        let (assembler, _) = assembler();
        let record = assembler
            .assemble("on 01/02/2024 then 15/03/2024 then 20/04/2024 and 25/05/2024")
            .await
            .unwrap();

        let dates = record.get("Dates").unwrap().as_group().unwrap();
        assert_eq!(dates["primary"].as_text(), Some("01/02/2024"));
        assert_eq!(dates["secondary"].as_text(), Some("15/03/2024"));
        assert_eq!(
            text_list(&dates["additional"]),
            vec!["20/04/2024", "25/05/2024"]
        );
    }

    #[tokio::test]
    async fn test_transaction_group() {
        let (assembler, _) = assembler();
        let record = assembler
            .assemble("Paid via TXN12345 and TXN999, settled in cash")
            .await
            .unwrap();

        let txn = record.get("Transaction").unwrap().as_group().unwrap();
        assert_eq!(txn["Reference"].as_text(), Some("TXN12345"));
        assert_eq!(txn["Mode"].as_text(), Some("Cash"));
    }

    #[tokio::test]
    async fn test_first_pincode_wins() {
        let (assembler, _) = assembler();
        let record = assembler
            .assemble("offices at 560001 and 110001")
            .await
            .unwrap();
        assert_eq!(
            record.get("Pincode").and_then(FieldValue::as_text),
            Some("560001")
        );
    }

    #[tokio::test]
    async fn test_products_shape() {
        let (assembler, _) = assembler();
        let record = assembler
            .assemble("Product name is Laptop\nQuantity is 2\nPrice is 45000")
            .await
            .unwrap();

        let products = record.get("Products").unwrap().as_list().unwrap();
        assert_eq!(products.len(), 1);
        let laptop = products[0].as_group().unwrap();
        assert_eq!(laptop["Name"].as_text(), Some("Laptop"));
        assert_eq!(laptop["Quantity"].as_text(), Some("2"));
        assert_eq!(laptop["Price"].as_text(), Some("45000"));
    }

    #[tokio::test]
    async fn test_registered_custom_field_is_probed() {
        let (assembler, memory) = assembler();
        memory.register("GST Number").await.unwrap();

        let record = assembler
            .assemble("Filing with GST Number: 29ABCDE1234F1Z5 this week")
            .await
            .unwrap();
        assert_eq!(
            record.get("GST Number").and_then(FieldValue::as_text),
            Some("29ABCDE1234F1Z5")
        );

        let stats = memory.stats().await;
        assert_eq!(stats["GST Number"].count, 1);
        assert_eq!(stats["GST Number"].samples, vec!["29ABCDE1234F1Z5"]);
    }

    #[tokio::test]
    async fn test_unmatched_custom_field_stays_absent() {
        let (assembler, memory) = assembler();
        memory.register("Invoice").await.unwrap();

        let record = assembler.assemble("nothing relevant here").await.unwrap();
        assert!(!record.contains("Invoice"));
    }

    #[tokio::test]
    async fn test_field_names_subset_of_known() {
        let (assembler, memory) = assembler();
        memory.register("Batch").await.unwrap();

        let record = assembler
            .assemble(
                "Asha Rao is 29 years old, Batch: B7, amount paid 450, email a@b.in, \
                 discussed renewal on 01/02/2024, pincode 560001, TXN77 in cash",
            )
            .await
            .unwrap();

        let known = memory.known_fields().await;
        let builtins = builtin_fields();
        for name in record.field_names() {
            assert!(
                builtins.contains(&name) || known.iter().any(|k| k == name),
                "unexpected field name: {name}"
            );
        }
    }

    #[tokio::test]
    async fn test_observe_feeds_memory() {
        let (assembler, memory) = assembler();
        assembler
            .assemble("Ramesh Kumar, phone 9876543210")
            .await
            .unwrap();

        let stats = memory.stats().await;
        assert_eq!(stats["Persons"].count, 1);
        assert_eq!(stats["Persons"].samples, vec!["Ramesh Kumar"]);
        assert_eq!(stats["Phone"].samples, vec!["9876543210"]);
        assert!(!stats.contains_key("timestamp"));
    }

    #[tokio::test]
    async fn test_gender_joins_personal_details() {
        let (assembler, _) = assembler();
        let record = assembler
            .assemble("Priya Sharma is 29 years old. Priya Sharma is female.")
            .await
            .unwrap();

        let details = record.get("PersonalDetails").unwrap().as_group().unwrap();
        let priya = details["Priya Sharma"].as_group().unwrap();
        assert_eq!(priya["Age"].as_text(), Some("29"));
        assert_eq!(priya["Gender"].as_text(), Some("Female"));
    }
}
