use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Input, Select};

use crate::config::{self, Settings};
use crate::controller::Controller;
use crate::models::DownloadOutcome;
use crate::sources::soundcloud::SoundCloudClient;

#[derive(Parser)]
#[command(name = "soundplow", about = "SoundCloud 트랙 다운로더")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// GUI 모드로 실행
    #[arg(long)]
    pub gui: bool,

    /// 설정 파일 경로 (기본: ~/.config/soundplow/settings.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 트랙 ID 또는 URL로 다운로드
    Download {
        /// 트랙 ID 또는 SoundCloud 트랙 URL
        #[arg(required = true)]
        targets: Vec<String>,
    },
    /// 트랙을 검색하여 선택한 곡을 다운로드
    Search {
        /// 검색어
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// 사용자의 새 좋아요를 감시하여 자동으로 다운로드
    Watch {
        /// 감시할 사용자명 (생략하면 설정의 like.user)
        user: Option<String>,
    },
    /// 다운로드 대기열 관리
    Queue {
        #[command(subcommand)]
        action: QueueCommand,
    },
    /// 설정 편집
    Config,
}

#[derive(Subcommand)]
pub enum QueueCommand {
    /// 대기열에 링크 추가
    Add {
        #[arg(required = true)]
        links: Vec<String>,
    },
    /// 대기열에서 링크 제거
    Remove { link: String },
    /// 대기열 보기
    List,
    /// 대기열의 모든 링크를 다운로드하고 비우기
    Run,
}

pub fn run(cli: Cli) -> Result<()> {
    let path = cli.config.clone().unwrap_or_else(config::settings_path);
    let settings = config::load_or_init(&path)?;

    match cli.command {
        Some(Commands::Download { targets }) => {
            cmd_download(open_controller(&path, settings)?, &targets)
        }
        Some(Commands::Search { query }) => {
            cmd_search(open_controller(&path, settings)?, &query.join(" "))
        }
        Some(Commands::Watch { user }) => cmd_watch(open_controller(&path, settings)?, user),
        Some(Commands::Queue { action }) => cmd_queue(&path, settings, action),
        Some(Commands::Config) => cmd_config(&path, settings),
        None => {
            if cli.gui {
                launch_gui(&path, settings)
            } else {
                println!("사용법: soundplow <명령어> 또는 soundplow --gui");
                println!("자세한 정보는 soundplow --help를 실행하세요.");
                Ok(())
            }
        }
    }
}

fn open_controller(path: &Path, settings: Settings) -> Result<Controller<SoundCloudClient>> {
    if !settings.soundcloud.is_configured() {
        bail!("SoundCloud client_id가 설정되지 않았습니다. 먼저 'soundplow config'를 실행하세요.");
    }
    settings.ensure_output_dir()?;

    let client = SoundCloudClient::new(&settings.soundcloud)?;
    Ok(Controller::new(client, settings, path.to_path_buf()))
}

#[cfg(feature = "gui")]
fn launch_gui(path: &Path, settings: Settings) -> Result<()> {
    crate::gui::launch(open_controller(path, settings)?)
}

#[cfg(not(feature = "gui"))]
fn launch_gui(_path: &Path, _settings: Settings) -> Result<()> {
    bail!("GUI 기능이 활성화되지 않았습니다. 다시 빌드하세요: cargo build --features gui")
}

fn cmd_download(controller: Controller<SoundCloudClient>, targets: &[String]) -> Result<()> {
    if let [target] = targets {
        // 결과는 이벤트 로그로 이미 출력된다
        let _ = controller.download_target(target);
    } else {
        let report = controller.batch_download(targets);
        println!(
            "다운로드 {}개, 건너뜀 {}개, 실패 {}개",
            report.downloaded, report.skipped, report.failed
        );
    }

    controller.shutdown()
}

fn cmd_search(controller: Controller<SoundCloudClient>, query: &str) -> Result<()> {
    let Ok(results) = controller.search(query) else {
        return Ok(());
    };
    if results.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "제목"]);
    for (i, track) in results.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(track.id),
            Cell::new(track.display_title()),
        ]);
    }
    println!("{table}");

    let mut items: Vec<String> = results.iter().map(|t| t.display_title()).collect();
    items.push("취소".to_string());

    let selection = Select::new()
        .with_prompt("다운로드할 트랙을 선택하세요")
        .items(&items)
        .default(0)
        .interact()?;

    if let Some(track) = results.get(selection) {
        if let Ok(outcome) = controller.download_track(track.id) {
            println!("{}", outcome.path().display());
        }
    }

    controller.shutdown()
}

fn cmd_watch(controller: Controller<SoundCloudClient>, user: Option<String>) -> Result<()> {
    let user = user
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| controller.settings_snapshot().like.user);
    if user.trim().is_empty() {
        bail!("감시할 사용자를 입력하세요: soundplow watch <USER>");
    }

    let downloaded = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&downloaded);
    controller.events().on_download_finished(move |outcome| {
        if let DownloadOutcome::Downloaded { .. } = outcome {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    controller
        .start_watching(&user)
        .with_context(|| format!("\"{}\" 사용자를 감시할 수 없습니다", user))?;

    println!("Enter 키를 누르면 감시를 멈추고 종료합니다.");
    if !wait_for_enter(std::io::stdin().lock())? {
        // 표준 입력이 없으면(nohup, 서비스 등) 시그널로 끝날 때까지 계속 감시한다
        tracing::info!("stdin closed, watching until interrupted");
        loop {
            std::thread::park();
        }
    }

    controller.shutdown()?;
    println!(
        "감시 중 {}곡을 다운로드했습니다.",
        downloaded.load(Ordering::SeqCst)
    );
    Ok(())
}

/// 한 줄을 읽으면 true, 입력이 이미 닫혀 있으면 false.
fn wait_for_enter(mut input: impl BufRead) -> std::io::Result<bool> {
    let mut line = String::new();
    Ok(input.read_line(&mut line)? > 0)
}

fn cmd_queue(path: &Path, mut settings: Settings, action: QueueCommand) -> Result<()> {
    match action {
        QueueCommand::Add { links } => {
            let mut queued = settings.queued_links();
            for link in links {
                let link = link.trim().to_string();
                config::validate_link(&link)?;
                queued.push(link);
            }
            settings.set_queued_links(&queued);
            config::save_settings(path, &settings)?;
            println!("대기열: {}개", queued.len());
            Ok(())
        }
        QueueCommand::Remove { link } => {
            let mut queued = settings.queued_links();
            let before = queued.len();
            queued.retain(|l| l != link.trim());
            if queued.len() == before {
                bail!("대기열에 없는 링크입니다: {}", link);
            }
            settings.set_queued_links(&queued);
            config::save_settings(path, &settings)?;
            println!("대기열: {}개", queued.len());
            Ok(())
        }
        QueueCommand::List => {
            let queued = settings.queued_links();
            if queued.is_empty() {
                println!("대기열이 비어 있습니다.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["#", "링크"]);
            for (i, link) in queued.iter().enumerate() {
                table.add_row(vec![Cell::new(i + 1), Cell::new(link)]);
            }
            println!("{table}");
            Ok(())
        }
        QueueCommand::Run => {
            let controller = open_controller(path, settings)?;
            let report = controller.download_queue();
            println!(
                "다운로드 {}개, 건너뜀 {}개, 실패 {}개",
                report.downloaded, report.skipped, report.failed
            );
            controller.shutdown()
        }
    }
}

fn cmd_config(path: &Path, mut settings: Settings) -> Result<()> {
    println!("soundplow 설정 ({})\n", path.display());

    let client_id: String = Input::new()
        .with_prompt("SoundCloud Client ID")
        .with_initial_text(settings.soundcloud.client_id.clone().unwrap_or_default())
        .interact_text()?;

    let output: String = Input::new()
        .with_prompt("출력 디렉토리")
        .with_initial_text(settings.general.output.display().to_string())
        .interact_text()?;

    let user: String = Input::new()
        .with_prompt("좋아요를 감시할 사용자")
        .with_initial_text(settings.like.user.clone())
        .allow_empty(true)
        .interact_text()?;

    settings.soundcloud.client_id = Some(client_id.trim().to_string());
    settings.general.output = PathBuf::from(output.trim());
    settings.like.user = user.trim().to_string();

    config::save_settings(path, &settings)?;
    settings.ensure_output_dir()?;
    println!("\n설정이 저장되었습니다!");
    Ok(())
}
