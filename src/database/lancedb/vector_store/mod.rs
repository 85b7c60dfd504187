
use super::QuoteRecord;
use crate::config::Config;
use crate::dataset::QuoteMetadata;
use crate::{QuoteSearchError, Result};
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase, Select},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Named vector collection holding one dataset snapshot
pub struct QuoteCollection {
    connection: Connection,
    name: String,
    vector_dimension: usize,
}

/// One nearest-neighbour hit
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteMatch {
    pub id: String,
    pub document: String,
    pub metadata: QuoteMetadata,
    /// Cosine distance to the query vector (lower is closer)
    pub distance: f32,
}

impl QuoteCollection {
    /// Open the collection, creating an empty one when it does not exist yet
    ///
    /// # Arguments
    /// * `config` - Application configuration holding the store path and collection name
    #[inline]
    pub async fn open_or_create(config: &Config) -> Result<Self> {
        let connection = Self::connect(&config.store.path).await?;
        let name = config.store.collection.clone();

        if Self::table_exists(&connection, &name).await? {
            let mut collection = Self {
                connection,
                name,
                vector_dimension: config.embedding.dimensions as usize,
            };
            collection.vector_dimension = collection.detect_vector_dimension().await?;
            debug!(
                "Reusing collection '{}' with {} dimensions",
                collection.name, collection.vector_dimension
            );
            return Ok(collection);
        }

        let collection = Self {
            connection,
            name,
            vector_dimension: config.embedding.dimensions as usize,
        };
        collection.create_table(collection.vector_dimension).await?;

        info!(
            "Created collection '{}' with {} dimensions",
            collection.name, collection.vector_dimension
        );
        Ok(collection)
    }

    /// Open a collection that must already exist
    #[inline]
    pub async fn open_existing(config: &Config) -> Result<Self> {
        let connection = Self::connect(&config.store.path).await?;
        let name = config.store.collection.clone();

        if !Self::table_exists(&connection, &name).await? {
            return Err(QuoteSearchError::CollectionNotFound(name));
        }

        let mut collection = Self {
            connection,
            name,
            vector_dimension: 0,
        };
        collection.vector_dimension = collection.detect_vector_dimension().await?;

        info!(
            "Opened collection '{}' ({} dimensions)",
            collection.name, collection.vector_dimension
        );
        Ok(collection)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    async fn connect(path: &Path) -> Result<Connection> {
        debug!("Connecting to LanceDB at {}", path.display());

        std::fs::create_dir_all(path).map_err(|e| {
            QuoteSearchError::Database(format!("Failed to create vector store directory: {}", e))
        })?;

        lancedb::connect(path.to_string_lossy().as_ref())
            .execute()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to connect to LanceDB: {}", e)))
    }

    async fn table_exists(connection: &Connection, name: &str) -> Result<bool> {
        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|t| t == name))
    }

    async fn open_table(&self) -> Result<Table> {
        self.connection
            .open_table(&self.name)
            .execute()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to open table: {}", e)))
    }

    async fn create_table(&self, vector_dim: usize) -> Result<()> {
        self.connection
            .create_empty_table(&self.name, Self::create_schema(vector_dim))
            .execute()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    /// Detect vector dimension from the stored schema
    async fn detect_vector_dimension(&self) -> Result<usize> {
        let schema = self
            .open_table()
            .await?
            .schema()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to get table schema: {}", e)))?;

        schema
            .fields()
            .iter()
            .find(|field| field.name() == "vector")
            .and_then(|field| match field.data_type() {
                DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
                _ => None,
            })
            .ok_or_else(|| {
                QuoteSearchError::Database(
                    "Could not find vector column or determine dimension".to_string(),
                )
            })
    }

    fn create_schema(vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("document", DataType::Utf8, false),
            Field::new("author", DataType::Utf8, true),
            Field::new("category", DataType::Utf8, true),
        ]))
    }

    /// Number of documents in the collection
    #[inline]
    pub async fn count(&self) -> Result<usize> {
        self.open_table()
            .await?
            .count_rows(None)
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to count rows: {}", e)))
    }

    /// Identifiers of every stored document, sorted
    #[inline]
    pub async fn ids(&self) -> Result<Vec<String>> {
        let count = self.count().await?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut stream = self
            .open_table()
            .await?
            .query()
            .select(Select::columns(&["id"]))
            .limit(count)
            .execute()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to query ids: {}", e)))?;

        let mut ids = Vec::with_capacity(count);
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to read id stream: {}", e)))?
        {
            let column = string_column(&batch, "id")?;
            ids.extend((0..batch.num_rows()).map(|row| column.value(row).to_string()));
        }

        ids.sort();
        Ok(ids)
    }

    /// Delete every document
    #[inline]
    pub async fn clear(&self) -> Result<()> {
        let count = self.count().await?;
        if count == 0 {
            debug!("Collection '{}' already empty", self.name);
            return Ok(());
        }

        self.open_table()
            .await?
            .delete("id IS NOT NULL")
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to clear collection: {}", e)))?;

        info!("Cleared {} documents from '{}'", count, self.name);
        Ok(())
    }

    /// Insert a batch of records
    ///
    /// The table is recreated first when the batch's vector dimension differs
    /// from the stored one.
    #[inline]
    pub async fn add(&mut self, records: &[QuoteRecord]) -> Result<()> {
        let Some(first) = records.first() else {
            debug!("No records to add");
            return Ok(());
        };

        let vector_dim = first.vector.len();
        if let Some(bad) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(QuoteSearchError::Database(format!(
                "Record {} has {} dimensions, expected {}",
                bad.id,
                bad.vector.len(),
                vector_dim
            )));
        }

        if vector_dim != self.vector_dimension {
            warn!(
                "Vector dimension changed from {} to {}, recreating collection '{}'",
                self.vector_dimension, vector_dim, self.name
            );
            self.recreate_table_with_dimension(vector_dim).await?;
        }

        let record_batch = self.create_record_batch(records)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        self.open_table()
            .await?
            .add(reader)
            .execute()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to insert records: {}", e)))?;

        info!("Added {} documents to '{}'", records.len(), self.name);
        Ok(())
    }

    /// Replace the whole collection with `records`.
    ///
    /// Clear and insert are separate operations; a failure in between leaves
    /// the collection partially populated.
    #[inline]
    pub async fn replace_all(&mut self, records: &[QuoteRecord]) -> Result<()> {
        self.clear().await?;
        self.add(records).await
    }

    async fn recreate_table_with_dimension(&mut self, vector_dim: usize) -> Result<()> {
        if Self::table_exists(&self.connection, &self.name).await? {
            self.connection
                .drop_table(&self.name)
                .await
                .map_err(|e| QuoteSearchError::Database(format!("Failed to drop table: {}", e)))?;
        }

        self.create_table(vector_dim).await?;
        self.vector_dimension = vector_dim;

        info!(
            "Collection '{}' recreated with {} dimensions",
            self.name, vector_dim
        );
        Ok(())
    }

    fn create_record_batch(&self, records: &[QuoteRecord]) -> Result<RecordBatch> {
        let vector_dim = self.vector_dimension;

        let mut flat_values = Vec::with_capacity(records.len() * vector_dim);
        for record in records {
            flat_values.extend_from_slice(&record.vector);
        }

        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            vector_dim as i32,
            Arc::new(Float32Array::from(flat_values)),
            None,
        )
        .map_err(|e| QuoteSearchError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.id.as_str()),
            )),
            Arc::new(vector_array),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.document.as_str()),
            )),
            Arc::new(StringArray::from(
                records
                    .iter()
                    .map(|r| r.metadata.author.as_deref())
                    .collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                records
                    .iter()
                    .map(|r| r.metadata.category.as_deref())
                    .collect::<Vec<_>>(),
            )),
        ];

        RecordBatch::try_new(Self::create_schema(vector_dim), arrays)
            .map_err(|e| QuoteSearchError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Nearest documents to `query_vector` by cosine distance, closest first
    ///
    /// # Arguments
    /// * `query_vector` - Vector in the same embedding space as the stored documents
    /// * `limit` - Maximum number of results; fewer come back when the collection is smaller
    #[inline]
    pub async fn query(&self, query_vector: &[f32], limit: usize) -> Result<Vec<QuoteMatch>> {
        debug!("Querying '{}' for {} nearest documents", self.name, limit);

        if query_vector.len() != self.vector_dimension {
            return Err(QuoteSearchError::Database(format!(
                "Query vector has {} dimensions, collection '{}' stores {}",
                query_vector.len(),
                self.name,
                self.vector_dimension
            )));
        }

        let table = self.open_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to count rows: {}", e)))?;
        if count == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        let mut stream = table
            .vector_search(query_vector)
            .map_err(|e| QuoteSearchError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to execute search: {}", e)))?;

        let mut matches = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| QuoteSearchError::Database(format!("Failed to read result stream: {}", e)))?
        {
            matches.extend(Self::parse_search_batch(&batch)?);
        }

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(limit);

        debug!("Query returned {} documents", matches.len());
        Ok(matches)
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<QuoteMatch>> {
        let ids = string_column(batch, "id")?;
        let documents = string_column(batch, "document")?;
        let authors = string_column(batch, "author")?;
        let categories = string_column(batch, "category")?;
        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| QuoteSearchError::Database("Missing _distance column".to_string()))?;

        let matches = (0..batch.num_rows())
            .map(|row| QuoteMatch {
                id: ids.value(row).to_string(),
                document: documents.value(row).to_string(),
                metadata: QuoteMetadata {
                    author: optional_value(authors, row),
                    category: optional_value(categories, row),
                },
                distance: distances.value(row),
            })
            .collect();

        Ok(matches)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| QuoteSearchError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| QuoteSearchError::Database(format!("Invalid {} column type", name)))
}

fn optional_value(column: &StringArray, row: usize) -> Option<String> {
    (!column.is_null(row)).then(|| column.value(row).to_string())
}
