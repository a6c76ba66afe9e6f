//! Command-line definition and dispatch.

use chrono::DateTime;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::future::Future;
use std::process::ExitCode;

use custodian_core::ledger::{Page, PageRequest};
use custodian_core::{AccountCustodyResult, CustodyServiceTrait};

use crate::config::Config;
use crate::main_lib::build_service;
use crate::report::{CustodyReport, ErrorEnvelope};

/// Exit status for failures worth retrying unchanged (EX_TEMPFAIL).
const EXIT_RETRYABLE: u8 = 75;

#[derive(Parser, Debug)]
#[command(name = "custodian", about = "Custody fee and assets-under-custody reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct WindowArgs {
    /// Window start, epoch milliseconds or RFC 3339
    #[arg(long, value_parser = parse_timestamp)]
    pub from: i64,
    /// Window end, epoch milliseconds or RFC 3339
    #[arg(long, value_parser = parse_timestamp)]
    pub to: i64,
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Only compute this 1-based page of accounts
    #[arg(long)]
    pub page: Option<u32>,
    /// Accounts per page (defaults to CUSTODY_ACCOUNT_PAGE_SIZE)
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report one account
    Account {
        /// Full account id, name@domain
        account_id: String,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Report every account of a domain
    Domain {
        domain: String,
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Report every account on the ledger
    System {
        #[command(flatten)]
        window: WindowArgs,
        #[command(flatten)]
        paging: PageArgs,
    },
}

/// Accepts epoch milliseconds or an RFC 3339 date-time.
pub fn parse_timestamp(raw: &str) -> Result<i64, String> {
    if let Ok(millis) = raw.parse::<i64>() {
        return Ok(millis);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| format!("'{}' is neither epoch milliseconds nor RFC 3339: {}", raw, e))
}

pub async fn run(cli: Cli, config: &Config) -> ExitCode {
    let service = match build_service(config) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to start: {:#}", e);
            return print_failure(ErrorEnvelope::from(&e));
        }
    };

    let result = match cli.command {
        Command::Account { account_id, window } => service
            .compute_account_custody(&account_id, window.from, window.to)
            .await
            .map(|assets| CustodyReport::for_account(&account_id, assets)),
        Command::Domain {
            domain,
            window,
            paging,
        } => {
            let domain = domain.as_str();
            collect_pages(config, paging, |page| {
                service.compute_domain_custody(domain, window.from, window.to, page)
            })
            .await
        }
        Command::System { window, paging } => {
            collect_pages(config, paging, |page| {
                service.compute_system_custody(window.from, window.to, page)
            })
            .await
        }
    };

    match result {
        Ok(report) => print_json(&report).unwrap_or_else(|e| {
            tracing::error!("Failed to write report: {}", e);
            ExitCode::FAILURE
        }),
        Err(e) => {
            tracing::error!("Custody report failed: {}", e);
            print_failure(ErrorEnvelope::from(&e))
        }
    }
}

/// Computes one requested page, or walks every page when none is given.
async fn collect_pages<F, Fut>(
    config: &Config,
    paging: PageArgs,
    mut compute: F,
) -> custodian_core::Result<CustodyReport>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = custodian_core::Result<Page<AccountCustodyResult>>>,
{
    let page_size = paging.page_size.unwrap_or(config.custody.account_page_size);
    if let Some(page_number) = paging.page {
        let page = compute(PageRequest::new(page_number, page_size)).await?;
        return Ok(CustodyReport::from_pages(vec![page]));
    }

    let mut pages = Vec::new();
    let mut page_number = 1;
    loop {
        let page = compute(PageRequest::new(page_number, page_size)).await?;
        tracing::info!(
            "Computed account page {}/{} ({} accounts)",
            page.page_number,
            page.total_pages,
            page.items.len()
        );
        let has_next = page.has_next();
        pages.push(page);
        if !has_next {
            break;
        }
        page_number += 1;
    }
    Ok(CustodyReport::from_pages(pages))
}

fn print_json<T: Serialize>(value: &T) -> serde_json::Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}

fn print_failure(envelope: ErrorEnvelope) -> ExitCode {
    let code = if envelope.retryable {
        ExitCode::from(EXIT_RETRYABLE)
    } else {
        ExitCode::FAILURE
    };
    if let Err(e) = print_json(&envelope) {
        tracing::error!("Failed to write error envelope: {}", e);
    }
    code
}
