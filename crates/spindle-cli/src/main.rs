use async_trait::async_trait;
use std::sync::Arc;
use tokio_stream::StreamExt;

use spindle_core::app::{BatchBuilder, CommandRef};
use spindle_core::domain::{
    BatchOptions, DiagnosticRecord, InputSource, Invocation, Progress, WorkerHost,
};
use spindle_core::error::SpindleError;
use spindle_core::ports::Procedure;

const USAGE: &str = "usage: spindle-cli <command> <input-file> [-Name value | -Flag]...";

/// 組み込みの procedure：入力をそのまま返す（動作確認用）
struct EchoInput;

#[async_trait]
impl Procedure for EchoInput {
    async fn call(
        &self,
        invocation: Invocation,
        host: WorkerHost,
    ) -> Result<Vec<serde_json::Value>, SpindleError> {
        host.verbose(format!("echo-input on worker {}", host.index()));
        Ok(invocation.positional(0).cloned().into_iter().collect())
    }
}

/// `-Name value` は named parameter、値が続かない `-Flag` は flag として扱う
fn apply_extra_arguments(mut options: BatchOptions, args: &[String]) -> Result<BatchOptions, String> {
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        let Some(name) = arg.strip_prefix('-').filter(|n| !n.is_empty()) else {
            return Err(format!("unexpected argument '{arg}'"));
        };
        match iter.next_if(|next| !next.starts_with('-')) {
            Some(value) => options = options.with_parameter(name, serde_json::Value::String(value.clone())),
            None => options = options.with_flag(name),
        }
    }
    Ok(options)
}

fn print_record(record: DiagnosticRecord) {
    match record.worker {
        Some(worker) => eprintln!("[{:?}] #{worker}: {}", record.stream, record.message),
        None => eprintln!("[{:?}] {}", record.stream, record.message),
    }
}

fn log_progress(progress: &Progress) {
    tracing::debug!(activity = %progress.activity, percent = progress.percent, "{}", progress.status);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // (A) 引数：コマンド名・入力ファイル・追加の引数
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [command, input_file, extra @ ..] = args.as_slice() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    // (B) 環境変数のオプション + 追加の引数
    let options = BatchOptions::from_env()?;
    let options = apply_extra_arguments(options, extra).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        eprintln!("{USAGE}");
        std::process::exit(2);
    });

    // (C) コマンド表：組み込み procedure + PATH
    let batch = BatchBuilder::new()
        .options(options)
        .procedure("echo-input", Arc::new(EchoInput))?
        .alias("echo", "echo-input")?
        .path_fallback()
        .build()?;

    // (D) 実行：結果は stdout（JSON lines）、diagnostic は stderr
    let mut run = batch
        .run(CommandRef::name(command.as_str()), InputSource::File(input_file.into()))
        .await?;
    tracing::info!(batch_id = %run.batch_id, "batch submitted");

    let mut records_open = true;
    let mut progress_open = true;
    loop {
        tokio::select! {
            next = run.results.next() => match next {
                Some(result) => println!("{}", serde_json::to_string(&result)?),
                None => break,
            },
            next = run.diagnostics.records.recv(), if records_open => match next {
                Some(record) => print_record(record),
                None => records_open = false,
            },
            changed = run.diagnostics.progress.changed(), if progress_open => match changed {
                Ok(()) => {
                    let snapshot = run.diagnostics.progress.borrow_and_update().clone();
                    if let Some(progress) = snapshot {
                        log_progress(&progress);
                    }
                }
                Err(_) => progress_open = false,
            },
        }
    }
    for record in run.diagnostics.drain_records() {
        print_record(record);
    }

    let summary = run.join().await?;
    eprintln!("{}", serde_json::to_string(&summary)?);

    if summary.timed_out {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn named_parameters_and_flags_are_split() {
        let options = apply_extra_arguments(
            BatchOptions::default(),
            &strings(&["-Name", "X", "-Verbose", "-Count", "3"]),
        )
        .unwrap();
        assert_eq!(options.extra_parameters.get("Name"), Some(&serde_json::json!("X")));
        assert_eq!(options.extra_parameters.get("Count"), Some(&serde_json::json!("3")));
        assert!(options.extra_flags.contains("Verbose"));
    }

    #[test]
    fn bare_values_are_rejected() {
        let result = apply_extra_arguments(BatchOptions::default(), &strings(&["oops"]));
        assert!(result.is_err());
    }
}
