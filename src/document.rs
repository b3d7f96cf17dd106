//! Document structure for schema-less indexing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A text field value with its storage flag.
///
/// Every field is indexed; `stored` additionally keeps the original text in
/// the index so it can be returned verbatim with search hits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldText {
    /// The raw field text.
    pub text: String,
    /// Whether the original text is retrievable after indexing.
    pub stored: bool,
}

impl FieldText {
    /// Create an indexed-only field value.
    pub fn new<S: Into<String>>(text: S) -> Self {
        FieldText {
            text: text.into(),
            stored: false,
        }
    }

    /// Create an indexed and stored field value.
    pub fn stored<S: Into<String>>(text: S) -> Self {
        FieldText {
            text: text.into(),
            stored: true,
        }
    }
}

/// A document represents a single item to be indexed.
///
/// Documents are collections of named text fields in schema-less mode.
/// Fields can be added dynamically without a predefined schema. The document
/// id is assigned by the index writer when the document is added; documents
/// themselves carry no id and are never mutated after submission.
///
/// Analyzers are configured at the writer level, not per-document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Document {
    /// The field values for this document
    fields: HashMap<String, FieldText>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document {
            fields: HashMap::new(),
        }
    }

    /// Add a field value to the document.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: FieldText) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field value from the document.
    pub fn get_field(&self, name: &str) -> Option<&FieldText> {
        self.fields.get(name)
    }

    /// Check if the document has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Get all field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(|s| s.as_str()).collect()
    }

    /// Get all field values.
    pub fn fields(&self) -> &HashMap<String, FieldText> {
        &self.fields
    }

    /// Get the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }
}

/// A builder for constructing documents in a fluent manner.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        DocumentBuilder {
            document: Document::new(),
        }
    }

    /// Add an indexed-only text field to the document.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document.add_field(name, FieldText::new(value));
        self
    }

    /// Add an indexed and stored text field to the document.
    pub fn add_stored_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document.add_field(name, FieldText::stored(value));
        self
    }

    /// Build the final document.
    pub fn build(self) -> Document {
        self.document
    }
}
