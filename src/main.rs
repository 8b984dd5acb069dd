#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::macros::format_description;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, fmt::time::LocalTime, EnvFilter};

use crate::api::HttpNotificationApi;
use crate::command::PanelEvent;
use crate::config::{AppConfig, Config};
use crate::csrf::CsrfTokenAccessor;
use crate::panel::PanelController;
use crate::snapshot::SnapshotView;

mod api;
mod command;
mod config;
mod csrf;
mod error;
mod model;
mod panel;
mod render;
mod runtime;
mod snapshot;
mod store;
mod view;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = match Config::new_from_file(&config_path) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.app.thread.max(1))
        .enable_all()
        .build()
    {
        Ok(v) => v,
        Err(e) => {
            eprintln!("创建运行时失败: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(async_main(config)) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn async_main(config: Config) -> Result<(), BoxError> {
    // 设置日志
    let _guard = init_tracing(&config.app)?;

    let mut csrf = CsrfTokenAccessor::new(&config.api.cookie);
    if let Some(page_file) = &config.api.page_file {
        match tokio::fs::read_to_string(page_file).await {
            Ok(html) => csrf = csrf.with_page(&html),
            Err(e) => tracing::error!("读取页面文件失败: {}, {}", page_file, e),
        }
    }
    let csrf = csrf
        .with_form_field(config.api.form_token.clone())
        .with_meta_tag(config.api.meta_token.clone());

    let api = Arc::new(HttpNotificationApi::new(&config.api, csrf)?);
    let view = SnapshotView::new(config.panel.snapshot_path.as_ref().map(PathBuf::from));
    let panel = PanelController::new(api, view, &config.panel);

    let (tx, rx) = mpsc::channel(64);

    // 从标准输入读取命令
    let stdin_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<PanelEvent>() {
                        Ok(event) => {
                            if stdin_tx.send(event).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => tracing::warn!("{}", e),
                    }
                }
                Ok(None) => {
                    tracing::info!("标准输入已关闭");
                    break;
                }
                Err(e) => {
                    tracing::error!("读取标准输入失败: {}", e);
                    break;
                }
            }
        }
        let _ = stdin_tx.send(PanelEvent::Shutdown).await;
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("收到退出信号");
            let _ = tx.send(PanelEvent::Shutdown).await;
        }
    });

    let refresh_interval = Duration::from_secs(config.panel.refresh_interval.max(1));
    tracing::info!(
        "通知面板启动, 接口地址: {}, 刷新间隔: {:?}",
        config.api.base_url,
        refresh_interval
    );
    runtime::run(panel, rx, refresh_interval).await;
    Ok(())
}

fn init_tracing(app: &AppConfig) -> Result<WorkerGuard, BoxError> {
    tracing_log::LogTracer::init()?;
    let log_level = match app.log_level.as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };
    let env_filter = EnvFilter::from_default_env()
        .add_directive("rustls=info".parse()?)
        .add_directive("hyper=info".parse()?)
        .add_directive(log_level.into());
    let (stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    let subscriber_builder = tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(stderr)
        .with_env_filter(env_filter)
        .with_timer(LocalTime::new(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
        )));
    match app.log_format.as_str() {
        "pretty" => tracing::subscriber::set_global_default(subscriber_builder.pretty().finish())?,
        "json" => tracing::subscriber::set_global_default(subscriber_builder.json().finish())?,
        _ => tracing::subscriber::set_global_default(subscriber_builder.finish())?,
    }
    Ok(guard)
}
