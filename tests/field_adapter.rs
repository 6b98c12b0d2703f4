//! SelectRemoteField value handling

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use remote_select::lookup::Row;
use remote_select::{
    EntityLookup, FieldAttributes, FieldValue, LookupConfig, LookupEngine, LookupError, LookupId,
    MemorySource, PairLookup, ResultPair, SelectOption, SelectRemoteField,
};

fn hosts_lookup() -> Arc<dyn PairLookup> {
    let source = MemorySource::new().with_table(
        "hosts",
        vec![
            Row::new().with("id", 1i64).with("name", "alpha"),
            Row::new().with("id", 2i64).with("name", "beta"),
        ],
    );
    let lookup = EntityLookup::new(
        "hosts",
        LookupConfig::new("hosts", "id").with_text_columns(["name"]),
    )
    .unwrap();
    Arc::new(LookupEngine::new(Arc::new(source)).bind(Arc::new(lookup)))
}

/// Records calls; optionally fails every lookup
#[derive(Default)]
struct RecordingLookup {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl PairLookup for RecordingLookup {
    async fn optional_pair(
        &self,
        id: &LookupId,
    ) -> remote_select::error::Result<Option<ResultPair>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LookupError::Source("connection reset".to_string()));
        }
        Ok(Some(ResultPair::new(id.to_string(), format!("label {id}"))))
    }

    async fn has_id(&self, _id: &LookupId) -> remote_select::error::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(!self.fail)
    }
}

#[tokio::test]
async fn test_scalar_value_registers_option() {
    let mut field = SelectRemoteField::new(
        "host",
        FieldAttributes::with_lookup(hosts_lookup()).attribute("class", "remote"),
    )
    .unwrap();

    field.set_value(2i64).await.unwrap();

    assert_eq!(field.value(), &FieldValue::Int(2));
    assert_eq!(field.option_label("2"), Some("beta"));
    assert_eq!(field.attributes().get("class").map(String::as_str), Some("remote"));
}

#[tokio::test]
async fn test_string_value_registers_option() {
    let mut field = SelectRemoteField::with_lookup("host", hosts_lookup());

    field.set_value("1").await.unwrap();

    assert_eq!(
        field.options(),
        &[SelectOption {
            value: "1".to_string(),
            label: "alpha".to_string()
        }]
    );
}

#[tokio::test]
async fn test_unknown_value_is_still_set() {
    let mut field = SelectRemoteField::with_lookup("host", hosts_lookup());

    field.set_value(42i64).await.unwrap();

    assert_eq!(field.value(), &FieldValue::Int(42));
    assert!(field.options().is_empty());
}

#[tokio::test]
async fn test_repeated_value_replaces_option() {
    let mut field = SelectRemoteField::with_lookup("host", hosts_lookup());
    field.add_option(SelectOption {
        value: "1".to_string(),
        label: "stale".to_string(),
    });

    field.set_value(1i64).await.unwrap();
    field.set_value(1i64).await.unwrap();

    assert_eq!(field.options().len(), 1);
    assert_eq!(field.option_label("1"), Some("alpha"));
}

#[tokio::test]
async fn test_list_and_null_skip_lookup() {
    let lookup = Arc::new(RecordingLookup::default());
    let mut field = SelectRemoteField::with_lookup("hosts", lookup.clone());

    field
        .set_value(vec!["1".to_string(), "2".to_string()])
        .await
        .unwrap();
    assert_eq!(
        field.value(),
        &FieldValue::List(vec!["1".to_string(), "2".to_string()])
    );

    field.set_value(FieldValue::Null).await.unwrap();
    assert_eq!(field.value(), &FieldValue::Null);

    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    assert!(field.options().is_empty());
}

#[tokio::test]
async fn test_lookup_error_leaves_value_unchanged() {
    let lookup = Arc::new(RecordingLookup {
        fail: true,
        ..Default::default()
    });
    let mut field = SelectRemoteField::with_lookup("host", lookup);

    let err = field.set_value("7").await.unwrap_err();

    assert!(err.is_query_error());
    assert_eq!(field.value(), &FieldValue::Null);
}

#[tokio::test]
async fn test_is_valid_choice() {
    let mut field = SelectRemoteField::with_lookup("host", hosts_lookup());
    assert!(field.is_valid_choice().await.unwrap());

    field.set_value(1i64).await.unwrap();
    assert!(field.is_valid_choice().await.unwrap());

    field.set_value(9i64).await.unwrap();
    assert!(!field.is_valid_choice().await.unwrap());

    field
        .set_value(vec!["1".to_string(), "2".to_string()])
        .await
        .unwrap();
    assert!(field.is_valid_choice().await.unwrap());

    field
        .set_value(vec!["1".to_string(), "3".to_string()])
        .await
        .unwrap();
    assert!(!field.is_valid_choice().await.unwrap());
}

#[test]
fn test_missing_lookup_is_configuration_error() {
    let err = SelectRemoteField::new("host", FieldAttributes::default()).unwrap_err();
    assert!(matches!(err, LookupError::Configuration(_)));
}
