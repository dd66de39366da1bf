use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use egui::{Color32, RichText};

use crate::controller::Controller;
use crate::events::{Event, LogLevel};
use crate::models::{Track, TrackId};
use crate::sources::soundcloud::SoundCloudClient;

const MAX_LOG_LINES: usize = 500;

enum BgResult {
    Event(Event),
    SearchDone(Vec<Track>),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Search,
    Like,
    Link,
}

pub struct SoundplowApp {
    controller: Arc<Controller<SoundCloudClient>>,
    ctx: egui::Context,
    tab: Tab,
    output_path: String,

    // Search
    search_query: String,
    last_query: String,
    search_results: Vec<Track>,
    requested: HashSet<TrackId>,

    // Likes
    like_user: String,
    watching: bool,

    // Links
    link_input: String,
    links: Vec<String>,

    // Log
    log_lines: Vec<(LogLevel, String)>,

    // Background tasks
    tx: mpsc::Sender<BgResult>,
    rx: mpsc::Receiver<BgResult>,
    running_tasks: usize,
}

impl SoundplowApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        controller: Arc<Controller<SoundCloudClient>>,
    ) -> Self {
        let (tx, rx) = mpsc::channel();

        // 코어 이벤트는 어느 스레드에서 오든 채널을 거쳐 UI 스레드에서 처리한다
        let event_tx = tx.clone();
        let repaint = cc.egui_ctx.clone();
        controller.events().subscribe(move |event| {
            let _ = event_tx.send(BgResult::Event(event.clone()));
            repaint.request_repaint();
        });

        let settings = controller.settings_snapshot();
        let mut app = Self {
            ctx: cc.egui_ctx.clone(),
            tab: Tab::Search,
            output_path: controller.output_dir().display().to_string(),
            search_query: String::new(),
            last_query: String::new(),
            search_results: Vec::new(),
            requested: HashSet::new(),
            like_user: settings.like.user.clone(),
            watching: controller.is_watching(),
            link_input: String::new(),
            links: controller.queued_links(),
            log_lines: Vec::new(),
            tx,
            rx,
            running_tasks: 0,
            controller,
        };

        app.push_log(
            LogLevel::Info,
            format!("{} 연결 준비 완료", app.controller.source_name()),
        );
        app
    }

    fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce(&Controller<SoundCloudClient>) -> Option<BgResult> + Send + 'static,
    {
        let controller = Arc::clone(&self.controller);
        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        self.running_tasks += 1;

        std::thread::spawn(move || {
            if let Some(result) = job(&controller) {
                let _ = tx.send(result);
            }
            let _ = tx.send(BgResult::Finished);
            ctx.request_repaint();
        });
    }

    fn start_search(&mut self) {
        let query = std::mem::take(&mut self.search_query);
        self.last_query = query.clone();
        self.spawn(move |c| c.search(&query).ok().map(BgResult::SearchDone));
    }

    fn download_result(&mut self, id: TrackId) {
        self.requested.insert(id);
        self.spawn(move |c| {
            let _ = c.download_track(id);
            None
        });
    }

    fn toggle_watching(&mut self) {
        let user = self.like_user.clone();
        self.spawn(move |c| {
            let _ = c.toggle_watching(&user);
            None
        });
    }

    fn add_link(&mut self) {
        if self.controller.queue_link(&self.link_input).is_ok() {
            self.link_input.clear();
        }
        self.links = self.controller.queued_links();
    }

    fn remove_link(&mut self, link: &str) {
        self.controller.remove_link(link);
        self.links = self.controller.queued_links();
    }

    fn download_all(&mut self) {
        self.links.clear();
        self.spawn(|c| {
            c.download_queue();
            None
        });
    }

    fn apply_output_path(&mut self) {
        self.controller
            .set_output_dir(PathBuf::from(self.output_path.trim()));
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        self.log_lines.push((level, message));
        if self.log_lines.len() > MAX_LOG_LINES {
            let excess = self.log_lines.len() - MAX_LOG_LINES;
            self.log_lines.drain(..excess);
        }
    }

    fn process_bg_results(&mut self) {
        while let Ok(result) = self.rx.try_recv() {
            match result {
                BgResult::Event(Event::Log { level, message }) => self.push_log(level, message),
                BgResult::Event(Event::WatchingChanged { watching, .. }) => {
                    self.watching = watching;
                }
                BgResult::Event(_) => {}
                BgResult::SearchDone(results) => {
                    self.search_results = results;
                    self.requested.clear();
                }
                BgResult::Finished => {
                    self.running_tasks = self.running_tasks.saturating_sub(1);
                    self.links = self.controller.queued_links();
                }
            }
        }
    }

    fn search_tab(&mut self, ui: &mut egui::Ui) {
        let mut search = false;
        ui.horizontal(|ui| {
            ui.label("검색어:");
            let response = ui.text_edit_singleline(&mut self.search_query);
            if ui.button("검색").clicked()
                || (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)))
            {
                search = true;
            }
        });
        if search {
            self.start_search();
        }

        if self.search_results.is_empty() {
            return;
        }

        ui.separator();
        ui.label(format!("\"{}\" 검색 결과", self.last_query));

        let mut download = None;
        egui::ScrollArea::vertical()
            .id_salt("search_results")
            .show(ui, |ui| {
                for track in &self.search_results {
                    let enabled = !self.requested.contains(&track.id);
                    let button = egui::Button::new(RichText::new(track.display_title()).size(14.0));
                    if ui.add_enabled(enabled, button).clicked() {
                        download = Some(track.id);
                    }
                }
            });

        if let Some(id) = download {
            self.download_result(id);
        }
    }

    fn like_tab(&mut self, ui: &mut egui::Ui) {
        let mut toggle = false;
        ui.horizontal(|ui| {
            ui.label("사용자:");
            ui.add_enabled(
                !self.watching,
                egui::TextEdit::singleline(&mut self.like_user),
            );
            let label = if self.watching {
                "감시 중지"
            } else {
                "감시 시작"
            };
            if ui.button(label).clicked() {
                toggle = true;
            }
        });

        if self.watching {
            ui.label("새로 좋아요한 곡을 자동으로 다운로드합니다.");
        }

        if toggle {
            self.toggle_watching();
        }
    }

    fn link_tab(&mut self, ui: &mut egui::Ui) {
        let mut add = false;
        ui.horizontal(|ui| {
            ui.label("링크:");
            let response = ui.text_edit_singleline(&mut self.link_input);
            if ui.button("추가").clicked()
                || (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)))
            {
                add = true;
            }
        });
        if add {
            self.add_link();
        }

        ui.separator();

        let mut remove = None;
        egui::ScrollArea::vertical()
            .id_salt("link_list")
            .max_height(220.0)
            .show(ui, |ui| {
                for link in &self.links {
                    ui.horizontal(|ui| {
                        if ui.small_button("✕").clicked() {
                            remove = Some(link.clone());
                        }
                        ui.label(link);
                    });
                }
            });
        if let Some(link) = remove {
            self.remove_link(&link);
        }

        ui.separator();
        if ui
            .add_enabled(!self.links.is_empty(), egui::Button::new("모두 다운로드"))
            .clicked()
        {
            self.download_all();
        }
    }
}

fn level_color(level: LogLevel, default: Color32) -> Color32 {
    match level {
        LogLevel::Info => default,
        LogLevel::Warning => Color32::from_rgb(0x9e, 0xce, 0x2f),
        LogLevel::Error => Color32::from_rgb(0xed, 0x2d, 0x2d),
        LogLevel::Success => Color32::from_rgb(0x4d, 0xd3, 0x0a),
    }
}

impl eframe::App for SoundplowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_bg_results();

        // Top panel: output directory
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("출력 폴더:");
                let response = ui.text_edit_singleline(&mut self.output_path);
                if response.lost_focus() {
                    self.apply_output_path();
                }
                if ui.button("폴더 선택").clicked() {
                    if let Some(folder) = rfd::FileDialog::new().pick_folder() {
                        self.output_path = folder.display().to_string();
                        self.apply_output_path();
                    }
                }
                if self.running_tasks > 0 {
                    ui.spinner();
                }
            });
        });

        // Bottom panel: log
        egui::TopBottomPanel::bottom("log_panel")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                ui.heading("로그");
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        let default = ui.visuals().text_color();
                        for (level, line) in &self.log_lines {
                            ui.colored_label(level_color(*level, default), line);
                        }
                    });
            });

        // Central panel: tabs
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Search, "검색");
                ui.selectable_value(&mut self.tab, Tab::Like, "좋아요");
                ui.selectable_value(&mut self.tab, Tab::Link, "링크");
            });
            ui.separator();

            match self.tab {
                Tab::Search => self.search_tab(ui),
                Tab::Like => self.like_tab(ui),
                Tab::Link => self.link_tab(ui),
            }
        });
    }
}
