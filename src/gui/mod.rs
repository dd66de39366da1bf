#[cfg(feature = "gui")]
mod app;

#[cfg(feature = "gui")]
pub fn launch(
    controller: crate::controller::Controller<crate::sources::soundcloud::SoundCloudClient>,
) -> anyhow::Result<()> {
    use std::sync::Arc;

    let controller = Arc::new(controller);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([720.0, 560.0]),
        ..Default::default()
    };

    let app_controller = Arc::clone(&controller);
    let result = eframe::run_native(
        "soundplow",
        options,
        Box::new(move |cc| Ok(Box::new(app::SoundplowApp::new(cc, app_controller)))),
    );

    // 창을 닫으면 감시를 멈추고 설정을 저장한다
    controller.shutdown()?;
    result.map_err(|e| anyhow::anyhow!("GUI 실행에 실패했습니다: {}", e))
}
