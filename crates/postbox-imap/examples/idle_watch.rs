#![allow(clippy::expect_used, clippy::doc_markdown)]
//! Example: watch INBOX with IDLE
//!
//! Logs in, selects INBOX and prints every update the server pushes until
//! Ctrl-C, then leaves IDLE and logs out.
//!
//! ## Running
//!
//! ```bash
//! IMAP_HOST=imap.example.com IMAP_USER=me@example.com IMAP_PASSWORD=secret \
//!     cargo run --package postbox-imap --example idle_watch
//! ```
//!
//! Set `RUST_LOG=postbox_imap=debug` to see the protocol exchange.

use postbox_imap::parser::Response;
use postbox_imap::transaction::{self, catalog};
use postbox_imap::types::Mailbox;
use postbox_imap::{Config, Connection};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postbox_imap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("IMAP_HOST").expect("IMAP_HOST not set");
    let user = std::env::var("IMAP_USER").expect("IMAP_USER not set");
    let password = std::env::var("IMAP_PASSWORD").expect("IMAP_PASSWORD not set");

    let mut conn = Connection::connect(&Config::new(host)).await?;
    let greeting = conn.receive_greeting().await?;
    println!("Connected: {}", greeting.text.text);

    transaction::run(&mut conn, catalog::Login::new(user, password))
        .await
        .into_result()?;

    let inbox = transaction::run(&mut conn, catalog::Select::new(Mailbox::inbox()))
        .await
        .into_result()?;
    println!("INBOX: {} messages, {} recent", inbox.exists, inbox.recent);

    let (idle, handle) = catalog::Idle::new(|response: &Response| {
        println!("  {response:?}");
        true
    });
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.done();
        }
    });

    println!("Idling, press Ctrl-C to stop");
    let result = transaction::run(&mut conn, idle).await;
    println!("IDLE ended: {} {}", result.code, result.description);

    transaction::run(&mut conn, catalog::Logout).await;
    conn.close().await?;
    Ok(())
}
