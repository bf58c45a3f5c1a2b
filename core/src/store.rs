//! SQLite persistence layer.
//!
//! RULE: only this module talks to the database. Everything else works
//! with the value types and calls store methods.

use crate::aggregate::CategorizedEntry;
use crate::category::Category;
use crate::error::{ReportError, ReportResult};
use crate::monthly::{CategorizedAmount, MonthlyReport};
use crate::report::{AccountReference, CreditScoreReport, ReportSignature, SignedReport};
use crate::types::{KeyId, UserId};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

pub struct ReportStore {
    conn: Connection,
}

impl ReportStore {
    /// Open (or create) the report database at `path`.
    pub fn open(path: &str) -> ReportResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ReportResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ReportResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_reports.sql"))?;
        Ok(())
    }

    // ── Reports ────────────────────────────────────────────────

    /// Persist a signed report with its monthly and category rows.
    pub fn insert_signed_report(&self, signed: &SignedReport) -> ReportResult<()> {
        let report = &signed.report;
        let signature = &signed.signature;
        let paths_json = serde_json::to_string(&signature.signed_field_paths)?;

        self.conn.execute(
            "INSERT INTO credit_score_report (
                 id, user_id, iban, bban, masked_pan, sort_code_account_number,
                 initial_balance, last_data_fetch_time, currency,
                 newest_transaction_date, oldest_transaction_date,
                 credit_limit, transactions_size, account_holder,
                 signature, signature_key_id, signature_field_paths
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                report.id.to_string(),
                report.user_id.to_string(),
                report.account_reference.iban,
                report.account_reference.bban,
                report.account_reference.masked_pan,
                report.account_reference.sort_code_account_number,
                report.initial_balance.to_string(),
                report.last_data_fetch_time.to_rfc3339(),
                report.currency,
                report.newest_transaction_date.map(|d| d.to_string()),
                report.oldest_transaction_date.map(|d| d.to_string()),
                report.credit_limit.as_ref().map(|c| c.to_string()),
                report.transactions_size,
                report.account_holder,
                signature.signature,
                signature.key_id.to_string(),
                paths_json,
            ],
        )?;

        for month in &report.credit_score_monthly {
            let monthly_id = Uuid::new_v4().to_string();
            self.conn.execute(
                "INSERT INTO credit_score_monthly_report (
                     id, report_id, year, month,
                     highest_balance, lowest_balance, average_balance,
                     incoming_transactions_size, outgoing_transactions_size
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    monthly_id,
                    report.id.to_string(),
                    month.year,
                    month.month,
                    month.highest_balance.to_string(),
                    month.lowest_balance.to_string(),
                    month.average_balance.to_string(),
                    month.incoming_transactions_size,
                    month.outgoing_transactions_size,
                ],
            )?;

            for (category, ca) in &month.categorized_amounts {
                self.conn.execute(
                    "INSERT INTO credit_score_monthly_category_report (
                         id, monthly_report_id, category, amount, transaction_total
                     ) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        Uuid::new_v4().to_string(),
                        monthly_id,
                        category.as_str(),
                        ca.amount.to_string(),
                        ca.transaction_count,
                    ],
                )?;
            }
        }

        Ok(())
    }

    /// Load a user's signed report, or `None` if no report exists.
    pub fn find_signed_report_by_user(&self, user_id: UserId) -> ReportResult<Option<SignedReport>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, iban, bban, masked_pan, sort_code_account_number,
                        initial_balance, last_data_fetch_time, currency,
                        newest_transaction_date, oldest_transaction_date,
                        credit_limit, transactions_size, account_holder,
                        signature, signature_key_id, signature_field_paths
                 FROM credit_score_report WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, Option<String>>(9)?,
                        row.get::<_, Option<String>>(10)?,
                        row.get::<_, u32>(11)?,
                        row.get::<_, Option<String>>(12)?,
                        row.get::<_, String>(13)?,
                        row.get::<_, String>(14)?,
                        row.get::<_, String>(15)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            id,
            iban,
            bban,
            masked_pan,
            sort_code_account_number,
            initial_balance,
            last_data_fetch_time,
            currency,
            newest_transaction_date,
            oldest_transaction_date,
            credit_limit,
            transactions_size,
            account_holder,
            signature,
            signature_key_id,
            paths_json,
        )) = row
        else {
            return Ok(None);
        };

        let report_id = parse_uuid(&id)?;
        let report = CreditScoreReport {
            id: report_id,
            user_id,
            account_reference: AccountReference {
                iban,
                bban,
                masked_pan,
                sort_code_account_number,
            },
            initial_balance: parse_decimal(&initial_balance)?,
            last_data_fetch_time: parse_timestamp(&last_data_fetch_time)?,
            currency,
            newest_transaction_date: newest_transaction_date
                .as_deref()
                .map(parse_date)
                .transpose()?,
            oldest_transaction_date: oldest_transaction_date
                .as_deref()
                .map(parse_date)
                .transpose()?,
            credit_limit: credit_limit.as_deref().map(parse_decimal).transpose()?,
            transactions_size,
            account_holder,
            credit_score_monthly: self.monthly_reports(report_id)?,
        };

        let signature = ReportSignature {
            signature,
            key_id: parse_uuid(&signature_key_id)?,
            signed_field_paths: serde_json::from_str(&paths_json)?,
        };

        Ok(Some(SignedReport { report, signature }))
    }

    /// Signature record alone, without hydrating the monthly tree.
    pub fn report_signature(&self, user_id: UserId) -> ReportResult<Option<ReportSignature>> {
        let row = self
            .conn
            .query_row(
                "SELECT signature, signature_key_id, signature_field_paths
                 FROM credit_score_report WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(signature, key_id, paths_json)| {
            Ok(ReportSignature {
                signature,
                key_id: parse_uuid(&key_id)?,
                signed_field_paths: serde_json::from_str(&paths_json)?,
            })
        })
        .transpose()
    }

    pub fn delete_report_by_user(&self, user_id: UserId) -> ReportResult<()> {
        self.conn.execute(
            "DELETE FROM credit_score_report WHERE user_id = ?1",
            params![user_id.to_string()],
        )?;
        Ok(())
    }

    fn monthly_reports(&self, report_id: Uuid) -> ReportResult<Vec<MonthlyReport>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, year, month, highest_balance, lowest_balance, average_balance,
                    incoming_transactions_size, outgoing_transactions_size
             FROM credit_score_monthly_report
             WHERE report_id = ?1
             ORDER BY year, month",
        )?;
        let rows = stmt.query_map(params![report_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, u32>(7)?,
            ))
        })?;

        let mut months = Vec::new();
        for row in rows {
            let (id, year, month, highest, lowest, average, incoming, outgoing) = row?;
            months.push(MonthlyReport {
                year,
                month,
                highest_balance: parse_decimal(&highest)?,
                lowest_balance: parse_decimal(&lowest)?,
                average_balance: parse_decimal(&average)?,
                incoming_transactions_size: incoming,
                outgoing_transactions_size: outgoing,
                categorized_amounts: self.categorized_amounts(&id)?,
            });
        }
        Ok(months)
    }

    fn categorized_amounts(
        &self,
        monthly_id: &str,
    ) -> ReportResult<BTreeMap<Category, CategorizedAmount>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, amount, transaction_total
             FROM credit_score_monthly_category_report
             WHERE monthly_report_id = ?1",
        )?;
        let rows = stmt.query_map(params![monthly_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?;

        let mut amounts = BTreeMap::new();
        for row in rows {
            let (category, amount, count) = row?;
            amounts.insert(
                parse_category(&category)?,
                CategorizedAmount {
                    amount: parse_decimal(&amount)?,
                    transaction_count: count,
                },
            );
        }
        Ok(amounts)
    }

    // ── Category aggregation ───────────────────────────────────

    /// Category rows for a user's report whose month starts inside the
    /// closed interval `[begin, end]`. Summation stays in Rust so the
    /// decimals keep their exact scale.
    pub fn categorized_entries_for_user(
        &self,
        user_id: UserId,
        begin: NaiveDate,
        end: NaiveDate,
    ) -> ReportResult<Vec<CategorizedEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.year, m.month, c.category, c.amount, c.transaction_total
             FROM credit_score_monthly_category_report c
             JOIN credit_score_monthly_report m ON c.monthly_report_id = m.id
             JOIN credit_score_report r ON m.report_id = r.id
             WHERE r.user_id = ?1
               AND printf('%04d-%02d-01', m.year, m.month) BETWEEN ?2 AND ?3",
            )?;
        let rows = stmt.query_map(
            params![user_id.to_string(), begin.to_string(), end.to_string()],
            |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, u32>(4)?,
                ))
            },
        )?;

        let mut entries = Vec::new();
        for row in rows {
            let (year, month, category, amount, count) = row?;
            let date = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
                ReportError::CorruptRecord(format!("invalid stored month {year}-{month}"))
            })?;
            entries.push(CategorizedEntry {
                date,
                category: parse_category(&category)?,
                amount: parse_decimal(&amount)?,
                transaction_count: count,
            });
        }
        Ok(entries)
    }

    // ── Public key archive ─────────────────────────────────────

    pub fn insert_public_key(
        &self,
        key_id: KeyId,
        der: &[u8],
        created_at: DateTime<Utc>,
    ) -> ReportResult<()> {
        self.conn.execute(
            "INSERT INTO report_public_key (key_id, public_key, created_at)
             VALUES (?1, ?2, ?3)",
            params![key_id.to_string(), der, created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn public_key_der(&self, key_id: KeyId) -> ReportResult<Option<Vec<u8>>> {
        Ok(self
            .conn
            .query_row(
                "SELECT public_key FROM report_public_key WHERE key_id = ?1",
                params![key_id.to_string()],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?)
    }

    pub fn public_keys(&self) -> ReportResult<Vec<(KeyId, Vec<u8>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key_id, public_key FROM report_public_key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut keys = Vec::new();
        for row in rows {
            let (key_id, der) = row?;
            keys.push((parse_uuid(&key_id)?, der));
        }
        Ok(keys)
    }
}

fn parse_uuid(value: &str) -> ReportResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| ReportError::CorruptRecord(format!("invalid uuid '{value}': {e}")))
}

fn parse_decimal(value: &str) -> ReportResult<BigDecimal> {
    BigDecimal::from_str(value)
        .map_err(|e| ReportError::CorruptRecord(format!("invalid decimal '{value}': {e}")))
}

fn parse_date(value: &str) -> ReportResult<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| ReportError::CorruptRecord(format!("invalid date '{value}': {e}")))
}

fn parse_timestamp(value: &str) -> ReportResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ReportError::CorruptRecord(format!("invalid timestamp '{value}': {e}")))
}

fn parse_category(value: &str) -> ReportResult<Category> {
    Category::from_str(value).map_err(ReportError::CorruptRecord)
}
