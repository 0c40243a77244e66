//! Command-line client for a knowledge-base backend.
//!
//! ```bash
//! cargo run --example kb_cli -- list
//! cargo run --example kb_cli -- upload notes.txt report.pdf
//! cargo run --example kb_cli -- delete report.pdf
//! cargo run --example kb_cli -- ask "What does the report conclude?"
//! ```
//!
//! Set `KB_OX_BASE_URL` to talk to something other than `http://localhost:8081`.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use kb_ox::{
    DocumentStore, ExtractMode, FileSelection, KnowledgeBase, Notice, UploadFile,
    UploadOrchestrator,
};

#[derive(Parser)]
#[command(name = "kb_cli")]
#[command(about = "Manage documents and ask questions against a knowledge base")]
struct Args {
    /// Backend address, overrides KB_OX_BASE_URL
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored documents
    List,
    /// Upload one or more files
    Upload { files: Vec<PathBuf> },
    /// Delete a document by file name
    Delete { name: String },
    /// Ask a question and print the answer as it streams in
    Ask {
        question: String,
        /// Extract per received fragment, without carrying partial values over
        #[arg(long)]
        per_fragment: bool,
    },
}

fn print_notice(notice: &Notice) {
    println!("[{}] {}", notice.severity, notice.message);
}

/// Write the part of `answer` not shown yet and flush it right away, so the
/// answer appears as it grows. Returns the new shown length.
fn write_increment<W: Write>(out: &mut W, answer: &str, shown: usize) -> io::Result<usize> {
    out.write_all(answer[shown..].as_bytes())?;
    out.flush()?;
    Ok(answer.len())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let kb = match args.base_url {
        Some(base_url) => KnowledgeBase::builder().base_url(base_url).build(),
        None => KnowledgeBase::load_from_env()?,
    };
    let store = DocumentStore::new(kb.clone());

    match args.command {
        Command::List => {
            let snapshot = store.refresh().await;
            if !snapshot.available {
                println!("document list unavailable");
            }
            for (i, doc) in snapshot.documents.iter().enumerate() {
                println!(
                    "{:>4}  {:<40} {:>10} MB  {}",
                    doc.key(i),
                    doc.file_name,
                    doc.size_mb().unwrap_or_else(|| "N/A".to_string()),
                    doc.upload_date
                );
            }
            println!("{} document(s)", snapshot.len());
        }
        Command::Upload { files } => {
            let mut selection = Vec::with_capacity(files.len());
            for path in &files {
                selection.push(UploadFile::from_path(path).await?);
            }

            let summary = FileSelection::summarize(&selection);
            if summary.count == 1 {
                println!(
                    "{} ({}, {} MB)",
                    summary.file_name,
                    summary.type_label().unwrap_or("unsupported type"),
                    summary.file_size_mb
                );
            } else {
                println!("{} files selected", summary.count);
            }

            let orchestrator = UploadOrchestrator::new(kb).with_store(store.clone());
            let mut progress = orchestrator.subscribe();
            let reporter = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let current = *progress.borrow_and_update();
                    if current.uploading {
                        println!("  {:>5.1}%", current.percent);
                    }
                }
            });

            match orchestrator.upload(&selection).await {
                Ok(outcome) => outcome.notices().iter().for_each(print_notice),
                Err(e) => print_notice(&Notice::from(&e)),
            }
            drop(orchestrator);
            reporter.await?;

            println!("{} document(s) stored", store.snapshot().len());
        }
        Command::Delete { name } => {
            print_notice(&store.delete_with_notice(&name).await);
        }
        Command::Ask {
            question,
            per_fragment,
        } => {
            let mode = if per_fragment {
                ExtractMode::PerFragment
            } else {
                ExtractMode::CarryOver
            };

            let mut answers = kb.ask_stream(&question, mode);
            let mut shown = 0;
            while let Some(answer) = answers.next().await {
                match answer {
                    Ok(answer) => {
                        shown = write_increment(&mut std::io::stdout(), &answer, shown)?;
                    }
                    Err(e) => {
                        println!();
                        print_notice(&Notice::for_question_error(&e));
                        return Ok(());
                    }
                }
            }
            println!();
        }
    }

    Ok(())
}
