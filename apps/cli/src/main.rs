//! koala-cli: 最適化項目の一覧／事前検証／安全性確認／バックアップ／復元／適用／事後検証を行う CLI。
//! 各サブコマンドは UI 操作としてディスパッチテーブルに渡す（config のみ直接処理）。

mod render;

use clap::{Parser, Subcommand};
use koala_composition::domain::model::{OptimizationCategory, SelectedItem};
use koala_composition::error::{Result, err};
use koala_composition::{ActionOutcome, OptimizerRuntime, UiAction, dispatch, init_logging};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "koala-cli", about = "KOALA gaming optimizer CLI", version)]
struct Cli {
    /// 結果をJSONで出力
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 最適化項目の一覧
    List {
        /// カテゴリで絞り込み（network, gaming, gpu, ...）
        #[arg(long)]
        category: Option<String>,
    },
    /// 最適化前の事前検証
    Validate,
    /// カテゴリ単位の安全性確認
    Safety {
        category: String,
    },
    /// 変更前の値をバックアップ
    Backup {
        /// 既存のバックアップを破棄する
        #[arg(long, default_value_t = false)]
        discard: bool,
    },
    /// バックアップの状態
    Status,
    /// バックアップから復元
    Restore,
    /// 指定項目を適用
    Apply {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// 適用後の動作確認
    PostCheck,
    /// 有効な設定と設定ファイルの場所を表示
    Config {
        /// 設定ファイルがなければ現在の設定で作成する
        #[arg(long, default_value_t = false)]
        init: bool,
    },
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("koala-cli failed: {e}");
            std::process::exit(1);
        }
    }
}

/// 成功なら true
fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging("koala-cli");

    // 全依存関係はComposition Rootで組み立て
    let runtime = OptimizerRuntime::new()?;
    if let Command::Config { init } = cli.command {
        return run_config(&runtime, init, cli.json);
    }
    let (action, filter) = to_action(cli.command)?;
    info!(action = action.as_str(), "CLI操作");

    let service = runtime.service();
    let outcome = match (dispatch(&service, action), filter) {
        (ActionOutcome::Items(items), Some(category)) => ActionOutcome::Items(
            items.into_iter().filter(|i| i.category == category).collect(),
        ),
        (outcome, _) => outcome,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&render::to_json(&outcome))?);
    } else {
        render::print_text(&outcome);
    }
    Ok(outcome.succeeded())
}

fn run_config(runtime: &OptimizerRuntime, init: bool, json: bool) -> Result<bool> {
    let created = init && runtime.init_config_file()?;
    let location = runtime.config_location();
    if json {
        let view = render::config_json(&location, created, runtime.config());
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        render::print_config(&location, created, runtime.config());
    }
    Ok(true)
}

/// サブコマンドを UI 操作に変換（list のカテゴリ絞り込みは表示側で行う）
fn to_action(command: Command) -> Result<(UiAction, Option<OptimizationCategory>)> {
    let action = match command {
        Command::List { category } => {
            let filter = category.as_deref().map(parse_category).transpose()?;
            return Ok((UiAction::ListItems, filter));
        }
        Command::Validate => UiAction::ValidateReadiness,
        Command::Safety { category } => UiAction::CheckSafety(parse_category(&category)?),
        Command::Backup { discard: true } => UiAction::DiscardBackup,
        Command::Backup { discard: false } => UiAction::CreateBackup,
        Command::Status => UiAction::BackupStatus,
        Command::Restore => UiAction::RestoreBackup,
        Command::Apply { names } => {
            UiAction::Apply(names.into_iter().map(SelectedItem::enabled).collect())
        }
        Command::PostCheck => UiAction::ValidatePost,
        Command::Config { .. } => return Err(err("config is not a UI action")),
    };
    Ok((action, None))
}

fn parse_category(name: &str) -> Result<OptimizationCategory> {
    OptimizationCategory::parse(name).ok_or_else(|| {
        let known: Vec<&str> = OptimizationCategory::all()
            .iter()
            .map(|c| c.as_str())
            .collect();
        err(format!(
            "unknown category '{name}' (expected one of: {})",
            known.join(", ")
        ))
    })
}
