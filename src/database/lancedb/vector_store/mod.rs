
use super::ChunkRecord;
use crate::DocsError;
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const TABLE_NAME: &str = "chunks";

/// Rows written per `add` call
const WRITE_BATCH_SIZE: usize = 1024;

/// Vector database store using LanceDB for exact nearest-neighbour search
pub struct VectorStore {
    connection: Connection,
    table_name: String,
}

/// Search result from vector similarity search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub record: ChunkRecord,
    /// Squared L2 distance to the query vector
    pub distance: f32,
}

impl VectorStore {
    /// Connect to the LanceDB database in `index_dir`, creating the directory if needed
    #[inline]
    pub async fn connect(index_dir: &Path) -> Result<Self, DocsError> {
        debug!("Connecting to LanceDB at path: {:?}", index_dir);

        std::fs::create_dir_all(index_dir).map_err(|e| {
            DocsError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", index_dir.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| DocsError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        Ok(Self {
            connection,
            table_name: TABLE_NAME.to_string(),
        })
    }

    /// Open an existing index; a missing directory or table is `IndexNotFound`
    #[inline]
    pub async fn open_existing(index_dir: &Path) -> Result<Self, DocsError> {
        if !index_dir.is_dir() {
            return Err(DocsError::IndexNotFound(index_dir.display().to_string()));
        }

        let store = Self::connect(index_dir).await?;
        if !store.table_exists().await? {
            return Err(DocsError::IndexNotFound(index_dir.display().to_string()));
        }

        Ok(store)
    }

    #[inline]
    pub async fn table_exists(&self) -> Result<bool, DocsError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| DocsError::Database(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.contains(&self.table_name))
    }

    /// Create schema with the specified vector dimension
    fn create_schema(vector_dim: usize) -> Result<Arc<Schema>, DocsError> {
        let list_size = i32::try_from(vector_dim)
            .map_err(|_| DocsError::Database(format!("Vector dimension too large: {}", vector_dim)))?;

        Ok(Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    list_size,
                ),
                false,
            ),
            Field::new("source", DataType::Utf8, false),
            Field::new("page", DataType::UInt32, true),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("created_at", DataType::Utf8, false),
        ])))
    }

    /// Replace the whole table with `records`.
    ///
    /// Any previous table is dropped first, so the stored rows always equal the
    /// latest call. An empty slice leaves an empty table of `vector_dim`.
    #[inline]
    pub async fn replace_all(
        &self,
        records: &[ChunkRecord],
        vector_dim: usize,
    ) -> Result<(), DocsError> {
        if let Some(bad) = records.iter().find(|r| r.vector.len() != vector_dim) {
            return Err(DocsError::Database(format!(
                "Vector for chunk {} has dimension {}, expected {}",
                bad.chunk_index,
                bad.vector.len(),
                vector_dim
            )));
        }

        self.drop_table_if_exists().await?;

        let schema = Self::create_schema(vector_dim)?;
        let table = self
            .connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| DocsError::Database(format!("Failed to create table: {}", e)))?;

        for batch in records.chunks(WRITE_BATCH_SIZE) {
            Self::store_batch(&table, batch, vector_dim).await?;
        }

        info!(
            "Stored {} chunks with {} dimensions in table {}",
            records.len(),
            vector_dim,
            self.table_name
        );
        Ok(())
    }

    async fn store_batch(
        table: &Table,
        records: &[ChunkRecord],
        vector_dim: usize,
    ) -> Result<(), DocsError> {
        debug!("Storing batch of {} chunks", records.len());

        let record_batch = Self::create_record_batch(records, vector_dim)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| DocsError::Database(format!("Failed to insert chunks: {}", e)))?;

        Ok(())
    }

    /// Create a RecordBatch from chunk records
    fn create_record_batch(
        records: &[ChunkRecord],
        vector_dim: usize,
    ) -> Result<RecordBatch, DocsError> {
        let len = records.len();

        let mut ids = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);
        let mut sources = Vec::with_capacity(len);
        let mut pages = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            ids.push(record.id.as_str());
            flat_values.extend_from_slice(&record.vector);
            sources.push(record.source.as_str());
            pages.push(record.page);
            chunk_indices.push(record.chunk_index);
            contents.push(record.content.as_str());
            created_ats.push(record.created_at.as_str());
        }

        let schema = Self::create_schema(vector_dim)?;

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let list_size = i32::try_from(vector_dim)
            .map_err(|_| DocsError::Database(format!("Vector dimension too large: {}", vector_dim)))?;
        let vector_array =
            FixedSizeListArray::try_new(field, list_size, Arc::new(values_array), None).map_err(
                |e| DocsError::Database(format!("Failed to create vector array: {}", e)),
            )?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(sources)),
            Arc::new(UInt32Array::from(pages)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| DocsError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Return the `limit` stored chunks closest to `query_vector`, nearest first.
    ///
    /// No ANN index is ever built on the table, so LanceDB runs an exact flat
    /// scan with squared L2 distance.
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, DocsError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self.open_table().await?;

        let results = table
            .vector_search(query_vector)
            .map_err(|e| DocsError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .distance_type(DistanceType::L2)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| DocsError::Database(format!("Failed to execute search: {}", e)))?;

        let mut search_results = Self::parse_search_results_stream(results).await?;
        search_results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        search_results.truncate(limit);

        Ok(search_results)
    }

    /// Parse search results from LanceDB stream into SearchResult structs
    async fn parse_search_results_stream(
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<SearchResult>, DocsError> {
        let mut search_results = Vec::new();

        while let Some(batch_result) = results
            .try_next()
            .await
            .map_err(|e| DocsError::Database(format!("Failed to read result stream: {}", e)))?
        {
            search_results.extend(Self::parse_search_batch(&batch_result)?);
        }

        debug!("Parsed {} search results from stream", search_results.len());
        Ok(search_results)
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, DocsError> {
        let ids = string_column(batch, "id")?;
        let sources = string_column(batch, "source")?;
        let contents = string_column(batch, "content")?;
        let created_ats = string_column(batch, "created_at")?;
        let pages = u32_column(batch, "page")?;
        let chunk_indices = u32_column(batch, "chunk_index")?;

        let vectors = batch
            .column_by_name("vector")
            .and_then(|col| col.as_any().downcast_ref::<FixedSizeListArray>());

        let distances = batch
            .column_by_name("_distance")
            .ok_or_else(|| DocsError::Database("Missing _distance column".to_string()))?
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| DocsError::Database("Invalid _distance column type".to_string()))?;

        let mut search_results = Vec::with_capacity(batch.num_rows());

        for row in 0..batch.num_rows() {
            let vector = vectors
                .map(|list| list.value(row))
                .and_then(|values| {
                    values
                        .as_any()
                        .downcast_ref::<Float32Array>()
                        .map(|floats| floats.values().to_vec())
                })
                .unwrap_or_default();

            let record = ChunkRecord {
                id: ids.value(row).to_string(),
                vector,
                source: sources.value(row).to_string(),
                page: if pages.is_null(row) {
                    None
                } else {
                    Some(pages.value(row))
                },
                chunk_index: chunk_indices.value(row),
                content: contents.value(row).to_string(),
                created_at: created_ats.value(row).to_string(),
            };

            search_results.push(SearchResult {
                record,
                distance: distances.value(row),
            });
        }

        Ok(search_results)
    }

    /// Get the total number of stored chunks
    #[inline]
    pub async fn count_chunks(&self) -> Result<u64, DocsError> {
        let table = self.open_table().await?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| DocsError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Dimension of the `vector` column of the stored table
    #[inline]
    pub async fn vector_dimension(&self) -> Result<usize, DocsError> {
        let table = self.open_table().await?;

        let schema = table
            .schema()
            .await
            .map_err(|e| DocsError::Database(format!("Failed to get table schema: {}", e)))?;

        match schema.field_with_name("vector").map(Field::data_type) {
            Ok(DataType::FixedSizeList(_, size)) => usize::try_from(*size)
                .map_err(|_| DocsError::Database(format!("Invalid vector dimension: {}", size))),
            _ => Err(DocsError::Database(
                "Could not find vector column or determine dimension".to_string(),
            )),
        }
    }

    async fn open_table(&self) -> Result<Table, DocsError> {
        self.connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| DocsError::Database(format!("Failed to open table: {}", e)))
    }

    /// Drop the chunks table if it exists
    async fn drop_table_if_exists(&self) -> Result<(), DocsError> {
        if self.table_exists().await? {
            info!("Dropping existing {} table", self.table_name);
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| DocsError::Database(format!("Failed to drop table: {}", e)))?;
        }

        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, DocsError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DocsError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DocsError::Database(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, DocsError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DocsError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| DocsError::Database(format!("Invalid {} column type", name)))
}
