//! NovelForge - LLM 驱动的小说生成工具
//!
//! 非交互式命令行驱动：
//! - new: 创建小说并生成角色、事件与大纲
//! - continue: 为已保存的小说续写章节
//! - info / list: 查看存档
//! - export: 导出纯文本手稿

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use novelforge::application::{
    BootstrapPlan, ManagerSet, NovelStorePort, OraclePort, PromptTemplates,
};
use novelforge::config::{load_config, load_config_from_path, print_config, AppConfig};
use novelforge::domain::Novel;
use novelforge::infrastructure::adapters::{HttpOracleClient, ResilientOracle, SeededRandom};
use novelforge::infrastructure::persistence::XmlFileNovelStore;

const DOCUMENT_EXTENSION: &str = "xml";
const EXPORT_EXTENSION: &str = "txt";

#[derive(Parser, Debug)]
#[command(name = "novelforge")]
#[command(about = "NovelForge - 基于 LLM 的小说生成工具")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认搜索 novelforge.toml / novelforge.local.toml）
    #[arg(short, long, env = "NOVELFORGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 创建新小说并保存
    New {
        #[arg(long)]
        title: String,

        /// 类型，如 奇幻、科幻、悬疑
        #[arg(long)]
        genre: String,

        /// 背景设定
        #[arg(long)]
        setting: String,

        /// 生成的角色数量
        #[arg(long, default_value_t = 3)]
        characters: usize,

        /// 生成的事件数量（默认取配置 generation.num_events）
        #[arg(long)]
        events: Option<usize>,

        /// 跳过大纲生成
        #[arg(long)]
        no_outline: bool,

        /// 全局上下文
        #[arg(long)]
        context: Option<String>,

        /// 存档文件名（默认使用标题）
        #[arg(long)]
        name: Option<String>,
    },

    /// 续写已保存的小说
    Continue {
        /// 存档名称或路径
        save: String,

        /// 生成的章节数
        #[arg(short = 'n', long, default_value_t = 1)]
        chapters: u32,
    },

    /// 显示存档概要
    Info {
        save: String,

        /// 以 JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 列出存档目录中的小说
    List,

    /// 导出纯文本手稿
    Export {
        save: String,

        /// 输出路径（默认 exports_dir/<标题>.txt）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = match &cli.config {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    print_config(&config);

    let store = XmlFileNovelStore::new();

    match cli.command {
        Command::New {
            title,
            genre,
            setting,
            characters,
            events,
            no_outline,
            context,
            name,
        } => {
            let managers = build_managers(&config).await?;
            let mut novel = Novel::create(title, genre, setting);
            tracing::info!(novel_id = %novel.id(), title = %novel.title(), "Novel created");

            if let Some(context) = context {
                managers.context.set_global_context(&mut novel, context);
            }

            let plan = BootstrapPlan {
                characters,
                events: events.unwrap_or(config.generation.num_events),
                outline: !no_outline,
            };
            let report = managers.bootstrap_novel(&mut novel, &plan).await;
            println!("生成了 {}/{} 个角色", report.characters, plan.characters);
            if plan.events > 0 {
                println!("生成了 {} 个事件", report.events);
            }
            if let Some(arcs) = report.outline_arcs {
                println!("生成了大纲（{} 个情节弧）", arcs);
            }
            for failure in &report.failures {
                eprintln!("生成失败: {}", failure);
            }

            let file_name = sanitize_file_name(name.as_deref().unwrap_or(novel.title()));
            let path = config
                .storage
                .saves_dir
                .join(format!("{}.{}", file_name, DOCUMENT_EXTENSION));
            store.save(&novel, &path).await?;
            println!("小说《{}》已保存到: {}", novel.title(), path.display());

            if let Some(failure) = report.failures.into_iter().next() {
                return Err(failure.into());
            }
        }

        Command::Continue { save, chapters } => {
            let managers = build_managers(&config).await?;
            let path = resolve_save_path(&config.storage.saves_dir, &save);
            let mut novel = store.load(&path).await?;

            for _ in 0..chapters {
                let generated = managers
                    .chapters
                    .generate_chapter(&mut novel)
                    .await
                    .map(|chapter| (chapter.number(), chapter.title.clone()));
                match generated {
                    Ok((number, title)) => println!("第{}章: {}", number, title),
                    Err(e) => {
                        // 已生成的章节仍然保存
                        tracing::error!(error = %e, "Chapter generation failed");
                        store.save(&novel, &path).await?;
                        return Err(e.into());
                    }
                }
            }

            store.save(&novel, &path).await?;
            println!("当前共 {} 章，已保存到: {}", novel.current_chapter(), path.display());
        }

        Command::Info { save, json } => {
            let path = resolve_save_path(&config.storage.saves_dir, &save);
            let novel = store.load(&path).await?;
            let summary = novel.summary();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("《{}》 ({})", summary.title, summary.id);
                println!("类型: {}", summary.genre);
                println!("背景: {}", summary.setting);
                println!("当前章节: {}", summary.current_chapter);
                println!(
                    "角色: {}  章节: {}  事件: {}  大纲: {}",
                    summary.character_count,
                    summary.chapter_count,
                    summary.event_count,
                    if summary.has_outline { "有" } else { "无" }
                );
                println!("创建时间: {}", summary.creation_date.format("%Y-%m-%d %H:%M:%S"));
                println!("修改时间: {}", summary.last_modified.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        Command::List => {
            let saved = store.list(&config.storage.saves_dir).await?;
            if saved.is_empty() {
                println!("没有找到已保存的小说");
            }
            for (index, info) in saved.iter().enumerate() {
                println!(
                    "{}. {} - {} ({}章) [{}] {}",
                    index + 1,
                    info.title,
                    info.genre,
                    info.chapters,
                    info.last_modified.format("%Y-%m-%d %H:%M:%S"),
                    info.filename
                );
            }
        }

        Command::Export { save, output } => {
            let path = resolve_save_path(&config.storage.saves_dir, &save);
            let novel = store.load(&path).await?;
            let output = output.unwrap_or_else(|| {
                config.storage.exports_dir.join(format!(
                    "{}.{}",
                    sanitize_file_name(novel.title()),
                    EXPORT_EXTENSION
                ))
            });
            store.export_text(&novel, &output).await?;
            println!("小说已导出到: {}", output.display());
        }
    }

    Ok(())
}

/// 初始化日志
fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},novelforge={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 组装 Oracle、随机源与管理器
async fn build_managers(config: &AppConfig) -> anyhow::Result<ManagerSet> {
    let client = HttpOracleClient::new(config.oracle.client_config())
        .context("Failed to build oracle client")?;
    let oracle: Arc<dyn OraclePort> = Arc::new(ResilientOracle::new(
        Arc::new(client),
        config.oracle.retry_config(),
    ));

    // 部分兼容服务未实现 /models，不可用时只告警
    if !oracle.health_check().await {
        tracing::warn!(base_url = %config.oracle.base_url, "Oracle health check failed");
    }

    let random = Arc::new(SeededRandom::new(config.generation.seed));

    let templates = match &config.prompts.file {
        Some(path) => PromptTemplates::load_file(path)?,
        None => PromptTemplates::default(),
    };

    Ok(ManagerSet::new(
        oracle,
        random,
        Arc::new(templates),
        config.generation.settings(),
    ))
}

/// 仅保留字母数字、空格、下划线与连字符
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "novel".to_string()
    } else {
        cleaned.to_string()
    }
}

/// 已存在的路径原样使用，否则视为存档目录下的名称
fn resolve_save_path(saves_dir: &Path, save: &str) -> PathBuf {
    let direct = PathBuf::from(save);
    if direct.is_file() {
        return direct;
    }
    let mut path = saves_dir.join(save);
    if path.extension().is_none() {
        path.set_extension(DOCUMENT_EXTENSION);
    }
    path
}
