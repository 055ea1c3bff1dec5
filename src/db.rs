use num_bigint::BigInt;
use postgres_types::ToSql;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info};

use crate::error::{DatabaseError, IndexerResult};
use crate::models::{
    EnvelopeFields, EventRecord, InitRecord, Provenance, SetContractToFundRecord, TransferAdminRecord,
};

pub struct Database {
    client: Client,
}

impl Database {
    pub async fn connect(dsn: &str, schema: &str) -> IndexerResult<Self> {
        let client = connect_pg(dsn, schema).await?;
        Ok(Self { client })
    }

    pub async fn test_connection(&self) -> IndexerResult<()> {
        self.client
            .execute("SELECT 1", &[])
            .await
            .map_err(DatabaseError::from)?;
        info!("PostgreSQL connection test successful");
        Ok(())
    }

    pub async fn upsert(&self, record: &EventRecord) -> IndexerResult<()> {
        match record {
            EventRecord::Init(r) => upsert_init(&self.client, r).await?,
            EventRecord::SetContractToFund(r) => upsert_set_contract_to_fund(&self.client, r).await?,
            EventRecord::TransferAdmin(r) => upsert_transfer_admin(&self.client, r).await?,
        }
        debug!(kind = %record.kind(), id = record.id(), "Record upserted");
        Ok(())
    }

    /// Upsert every record, logging failures and carrying on. Returns how many were written.
    pub async fn persist_all(&self, records: &[EventRecord]) -> usize {
        let mut written = 0;
        for record in records {
            match self.upsert(record).await {
                Ok(()) => written += 1,
                Err(e) => error!(
                    kind = %record.kind(),
                    id = record.id(),
                    "Failed to upsert record: {:?}",
                    e
                ),
            }
        }
        written
    }
}

pub async fn connect_pg(dsn: &str, schema: &str) -> Result<Client, DatabaseError> {
    let (client, connection) = tokio_postgres::connect(dsn, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("Postgres connection error: {:?}", e);
        }
    });

    // Create tables if not exist
    client.batch_execute(schema).await?;

    info!("PostgreSQL ready");

    Ok(client)
}

// NUMERIC columns are bound as text and cast server side
fn numeric<T: ToString>(value: &T) -> String {
    value.to_string()
}

fn optional_numeric(value: &Option<BigInt>) -> Option<String> {
    value.as_ref().map(numeric)
}

const PROVENANCE_COLUMNS: &str = "block_time, block_height, block_hash, predecessor_id, receiver_id, signer_id, \
     signer_public_key, gas_burned, tokens_burned, outcome_id, executor_id, outcome_block_hash, \
     standard, event, version";

const PROVENANCE_UPDATES: &str = "block_time = EXCLUDED.block_time, block_height = EXCLUDED.block_height, \
     block_hash = EXCLUDED.block_hash, predecessor_id = EXCLUDED.predecessor_id, \
     receiver_id = EXCLUDED.receiver_id, signer_id = EXCLUDED.signer_id, \
     signer_public_key = EXCLUDED.signer_public_key, gas_burned = EXCLUDED.gas_burned, \
     tokens_burned = EXCLUDED.tokens_burned, outcome_id = EXCLUDED.outcome_id, \
     executor_id = EXCLUDED.executor_id, outcome_block_hash = EXCLUDED.outcome_block_hash, \
     standard = EXCLUDED.standard, event = EXCLUDED.event, version = EXCLUDED.version";

// $2..$16 in PROVENANCE_COLUMNS order
const PROVENANCE_PLACEHOLDERS: &str = "$2::TEXT::NUMERIC, $3::TEXT::NUMERIC, $4, $5, $6, $7, $8, \
     $9::TEXT::NUMERIC, $10::TEXT::NUMERIC, $11, $12, $13, $14, $15, $16";

struct ProvenanceParams {
    block_time: String,
    block_height: String,
    gas_burned: String,
    tokens_burned: String,
}

impl ProvenanceParams {
    fn new(provenance: &Provenance) -> Self {
        Self {
            block_time: numeric(&provenance.block_time),
            block_height: numeric(&provenance.block_height),
            gas_burned: numeric(&provenance.gas_burned),
            tokens_burned: numeric(&provenance.tokens_burned),
        }
    }
}

fn upsert_statement(table: &str, payload_columns: &[(&str, &str)]) -> String {
    let mut columns = format!("id, {PROVENANCE_COLUMNS}");
    let mut placeholders = format!("$1, {PROVENANCE_PLACEHOLDERS}");
    let mut updates = PROVENANCE_UPDATES.to_string();

    for (i, (column, cast)) in payload_columns.iter().enumerate() {
        let index = 17 + i;
        columns.push_str(&format!(", {column}"));
        placeholders.push_str(&format!(", ${index}{cast}"));
        updates.push_str(&format!(", {column} = EXCLUDED.{column}"));
    }

    format!(
        "INSERT INTO {table} ({columns}) VALUES ({placeholders}) \
         ON CONFLICT (id) DO UPDATE SET {updates}"
    )
}

async fn execute_upsert(
    client: &Client,
    statement: &str,
    id: &str,
    provenance: &Provenance,
    envelope: &EnvelopeFields,
    payload: &[&(dyn ToSql + Sync)],
) -> Result<(), DatabaseError> {
    let numbers = ProvenanceParams::new(provenance);
    let common: [&(dyn ToSql + Sync); 16] = [
        &id,
        &numbers.block_time,
        &numbers.block_height,
        &provenance.block_hash,
        &provenance.predecessor_id,
        &provenance.receiver_id,
        &provenance.signer_id,
        &provenance.signer_public_key,
        &numbers.gas_burned,
        &numbers.tokens_burned,
        &provenance.outcome_id,
        &provenance.executor_id,
        &provenance.outcome_block_hash,
        &envelope.standard,
        &envelope.event,
        &envelope.version,
    ];
    let mut params = common.to_vec();
    params.extend_from_slice(payload);

    client.execute(statement, &params).await?;
    Ok(())
}

async fn upsert_init(client: &Client, record: &InitRecord) -> Result<(), DatabaseError> {
    let statement = upsert_statement(
        "init",
        &[("admin_id", ""), ("admin_set", "::TEXT::NUMERIC"), ("account_id", "")],
    );
    let admin_set = optional_numeric(&record.admin_set);

    execute_upsert(
        client,
        &statement,
        &record.id,
        &record.provenance,
        &record.envelope,
        &[&record.admin_id, &admin_set, &record.account_id],
    )
    .await
}

async fn upsert_set_contract_to_fund(
    client: &Client,
    record: &SetContractToFundRecord,
) -> Result<(), DatabaseError> {
    let statement = upsert_statement(
        "set_contract_to_fund",
        &[
            ("contract_public_key", ""),
            ("allowance", ""),
            ("contract", ""),
            ("methods", ""),
            ("time", "::TEXT::NUMERIC"),
            ("admin", ""),
        ],
    );
    let time = optional_numeric(&record.time);

    execute_upsert(
        client,
        &statement,
        &record.id,
        &record.provenance,
        &record.envelope,
        &[
            &record.contract_public_key,
            &record.allowance,
            &record.contract,
            &record.methods,
            &time,
            &record.admin,
        ],
    )
    .await
}

async fn upsert_transfer_admin(
    client: &Client,
    record: &TransferAdminRecord,
) -> Result<(), DatabaseError> {
    let statement = upsert_statement(
        "transfer_admin",
        &[
            ("transferred_from", ""),
            ("transferred", "::TEXT::NUMERIC"),
            ("transferred_to", ""),
        ],
    );
    let transferred = optional_numeric(&record.transferred);

    execute_upsert(
        client,
        &statement,
        &record.id,
        &record.provenance,
        &record.envelope,
        &[&record.transferred_from, &transferred, &record.transferred_to],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_statement_numbers_payload_after_provenance() {
        let statement = upsert_statement("init", &[("admin_id", ""), ("admin_set", "::TEXT::NUMERIC")]);

        assert!(statement.starts_with("INSERT INTO init (id, block_time,"));
        assert!(statement.contains("$16, $17, $18::TEXT::NUMERIC)"));
        assert!(statement.ends_with("admin_id = EXCLUDED.admin_id, admin_set = EXCLUDED.admin_set"));
        assert!(statement.contains("ON CONFLICT (id) DO UPDATE SET block_time = EXCLUDED.block_time"));
    }

    #[test]
    fn test_numeric_params_are_decimal_text() {
        assert_eq!(numeric(&u128::MAX), "340282366920938463463374607431768211455");
        assert_eq!(optional_numeric(&Some(BigInt::from(-7))), Some("-7".to_string()));
        assert_eq!(optional_numeric(&None), None);
    }
}
