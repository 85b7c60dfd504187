use super::*;

#[test]
fn record_from_document() {
    let document = QuoteDocument {
        id: "quote_3".to_string(),
        text: "\"Be yourself.\" — Oscar Wilde".to_string(),
        metadata: QuoteMetadata {
            author: Some("Oscar Wilde".to_string()),
            category: None,
        },
    };

    let record = QuoteRecord::from_document(document, vec![0.1, 0.2, 0.3]);

    assert_eq!(record.id, "quote_3");
    assert_eq!(record.document, "\"Be yourself.\" — Oscar Wilde");
    assert_eq!(record.vector.len(), 3);
    assert_eq!(record.metadata.author.as_deref(), Some("Oscar Wilde"));
    assert_eq!(record.metadata.category, None);
}

#[test]
fn metadata_serializes_missing_fields_as_null() {
    let metadata = QuoteMetadata {
        author: None,
        category: Some("wisdom".to_string()),
    };

    let json = serde_json::to_value(&metadata).expect("can serialize json");
    assert_eq!(
        json,
        serde_json::json!({ "author": null, "category": "wisdom" })
    );
}
