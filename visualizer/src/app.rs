use crate::gauge::RatioGauge;
use hsadcore::config::{SessionConfig, DEFAULT_ENDPOINT};
use hsadcore::input::{FileSelector, SelectedFile, IMAGE_EXTENSIONS};
use hsadcore::prelude::AnalyzeTransport;
use hsadcore::session::{Completion, SessionController, SessionPhase, SessionSnapshot};
use iced::{
    widget::{
        button, canvas::Canvas, column, image, row, scrollable, text, text_input, Column,
        Container,
    },
    Alignment, Color, Element, Length, Task, Theme,
};
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::watch;

const HISTORY_LIMIT: usize = 20;

pub struct App {
    session: SessionController,
    updates: watch::Receiver<SessionSnapshot>,
    snapshot: SessionSnapshot,
    visualization: Option<image::Handle>,
    history: Vec<String>,
    pick_seq: u64,
}

#[derive(Debug, Clone)]
pub enum Message {
    EndpointChanged(String),
    ChooseFile,
    FileLoaded(u64, Result<SelectedFile, String>),
    Analyze,
    AnalysisFinished(Completion),
}

pub fn title(_: &App) -> String {
    "Hyperspectral Anomaly Detection".into()
}

pub fn theme(_: &App) -> Theme {
    Theme::Dark
}

impl App {
    pub fn boot(config: SessionConfig, transport: Arc<dyn AnalyzeTransport>) -> (Self, Task<Message>) {
        let session = SessionController::new(&config, transport);
        let updates = session.subscribe();
        let snapshot = updates.borrow().clone();
        (
            App {
                session,
                updates,
                snapshot,
                visualization: None,
                history: Vec::new(),
                pick_seq: 0,
            },
            Task::none(),
        )
    }

    pub fn update(state: &mut Self, message: Message) -> Task<Message> {
        let task = match message {
            Message::EndpointChanged(value) => {
                state.session.set_endpoint(value);
                Task::none()
            }
            Message::ChooseFile => {
                let picked = rfd::FileDialog::new()
                    .add_filter("image", IMAGE_EXTENSIONS)
                    .pick_file();
                match picked {
                    Some(path) => {
                        let seq = state.next_pick();
                        Task::perform(
                            async move {
                                SelectedFile::load(&path)
                                    .await
                                    .map_err(|err| format!("{}: {}", path.display(), err))
                            },
                            move |loaded| Message::FileLoaded(seq, loaded),
                        )
                    }
                    None => Task::none(),
                }
            }
            Message::FileLoaded(seq, loaded) if seq != state.pick_seq => {
                if let Ok(file) = loaded {
                    debug!("dropping superseded load of {}", file.name());
                }
                Task::none()
            }
            Message::FileLoaded(_, Ok(file)) => {
                let session = &mut state.session;
                FileSelector::new(|file| session.select_file(file)).pick(Some(file));
                Task::none()
            }
            Message::FileLoaded(_, Err(err)) => {
                warn!("could not read selected file: {}", err);
                state.push_history(format!("Could not read {}", err));
                Task::none()
            }
            Message::Analyze => match state.session.begin() {
                Ok(pending) => {
                    debug!("request {} dispatched", pending.id());
                    Task::perform(pending.run(), Message::AnalysisFinished)
                }
                Err(err) => {
                    debug!("analyze refused: {}", err);
                    Task::none()
                }
            },
            Message::AnalysisFinished(completion) => {
                state.session.complete(completion);
                Task::none()
            }
        };
        state.sync();
        task
    }

    pub fn view(state: &Self) -> Element<'_, Message> {
        let snapshot = &state.snapshot;

        let mut input_column = column![
            text("Hyperspectral Anomaly Detection").size(26),
            text("API URL:").size(14),
            text_input(DEFAULT_ENDPOINT, &snapshot.endpoint)
                .on_input(Message::EndpointChanged)
                .padding(6),
            button("Choose image").on_press(Message::ChooseFile).padding(10),
            text("Upload your hyperspectral image file").size(12),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(380.0));

        if let Some(file) = &snapshot.file {
            input_column = input_column.push(
                text(format!("Selected: {} ({} bytes)", file.name, file.size))
                    .size(14)
                    .color(Color::from_rgb(0.35, 0.8, 0.45)),
            );
        }

        input_column = input_column.push(
            button(text(state.analyze_label()))
                .on_press_maybe(snapshot.can_analyze().then_some(Message::Analyze))
                .padding(10),
        );

        if let Some(error) = &snapshot.error {
            input_column = input_column.push(
                text(error.clone())
                    .size(14)
                    .color(Color::from_rgb(0.95, 0.35, 0.35)),
            );
        }

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };
        input_column = input_column
            .push(text("Activity log").size(16))
            .push(Container::new(scrollable(history_list).height(Length::Fixed(140.0))).padding(6));

        let layout = row![input_column, state.result_column()]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn result_column(&self) -> Element<'_, Message> {
        let Some(result) = &self.snapshot.result else {
            let placeholder = if self.snapshot.is_running() {
                "Analyzing..."
            } else {
                "No analysis results yet"
            };
            return column![text("Analysis Results").size(26), text(placeholder).size(14)]
                .spacing(10)
                .padding(16)
                .width(Length::Fill)
                .into();
        };

        let mut result_column = column![
            text("Analysis Results").size(26),
            text(format!("Anomalies detected: {}", result.anomaly_count)).size(18),
            text(format!("Total pixels: {}", result.total_pixels)).size(14),
            text(format!("Anomaly percentage: {}", result.percentage_label())).size(14),
            Canvas::new(RatioGauge::new(result.anomaly_ratio()))
                .width(Length::Fill)
                .height(Length::Fixed(18.0)),
            text("Visualization:").size(16),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        result_column = match &self.visualization {
            Some(handle) => result_column.push(image(handle.clone()).width(Length::Fill)),
            None => result_column.push(text("No visualization returned").size(12)),
        };

        result_column.into()
    }

    fn analyze_label(&self) -> &'static str {
        if self.snapshot.is_running() {
            "Analyzing..."
        } else {
            "Analyze Image"
        }
    }

    /// Pulls the latest published snapshot and derives view-only state from it.
    fn sync(&mut self) {
        if !self.updates.has_changed().unwrap_or(false) {
            return;
        }
        let next = self.updates.borrow_and_update().clone();

        if next.result != self.snapshot.result {
            self.visualization = next
                .result
                .as_ref()
                .and_then(|result| result.visualization.as_ref())
                .and_then(|visualization| match visualization.decode() {
                    Ok(bytes) => Some(image::Handle::from_bytes(bytes)),
                    Err(err) => {
                        warn!("visualization is not valid base64: {}", err);
                        None
                    }
                });
        }

        if next.phase != self.snapshot.phase || next.error != self.snapshot.error {
            if let Some(entry) = history_entry(&next) {
                self.push_history(entry);
            }
        }
        self.snapshot = next;
    }

    /// Starts a new file pick; loads tagged with an older sequence are dropped.
    fn next_pick(&mut self) -> u64 {
        self.pick_seq += 1;
        self.pick_seq
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
    }
}

fn history_entry(snapshot: &SessionSnapshot) -> Option<String> {
    let file_name = snapshot
        .file
        .as_ref()
        .map(|file| file.name.as_str())
        .unwrap_or("no file");
    match snapshot.phase {
        SessionPhase::Idle => snapshot.error.clone(),
        SessionPhase::FileSelected => Some(format!("Selected {}", file_name)),
        SessionPhase::Running => Some(format!("Uploading {} to {}", file_name, snapshot.endpoint)),
        SessionPhase::Succeeded => snapshot.result.as_ref().map(|result| {
            format!(
                "{}: {} anomalies / {} pixels ({})",
                file_name,
                result.anomaly_count,
                result.total_pixels,
                result.percentage_label()
            )
        }),
        SessionPhase::Failed => snapshot
            .error
            .as_ref()
            .map(|error| format!("{} failed: {}", file_name, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsadcore::api::{AnalysisResult, Visualization};
    use hsadcore::prelude::{AnalyzeError, NO_FILE_MESSAGE};
    use hsadcore::transport::HttpTransport;

    fn app() -> App {
        let config = SessionConfig::default();
        let transport = HttpTransport::new(&config).unwrap();
        App::boot(config, Arc::new(transport)).0
    }

    fn scene() -> SelectedFile {
        SelectedFile::new("scene.png", vec![1u8, 2, 3])
    }

    #[test]
    fn analyze_without_file_shows_message() {
        let mut state = app();
        let _ = App::update(&mut state, Message::Analyze);
        assert_eq!(state.snapshot.error.as_deref(), Some(NO_FILE_MESSAGE));
        assert_eq!(state.history.last().map(String::as_str), Some(NO_FILE_MESSAGE));
    }

    #[tokio::test]
    async fn running_request_relabels_button() {
        let mut state = app();
        let seq = state.next_pick();
        let _ = App::update(&mut state, Message::FileLoaded(seq, Ok(scene())));
        assert_eq!(state.snapshot.phase, SessionPhase::FileSelected);
        assert_eq!(state.analyze_label(), "Analyze Image");

        let _ = App::update(&mut state, Message::Analyze);
        assert!(state.snapshot.is_running());
        assert!(!state.snapshot.can_analyze());
        assert_eq!(state.analyze_label(), "Analyzing...");
    }

    #[tokio::test]
    async fn finished_request_renders_result() {
        let mut state = app();
        let seq = state.next_pick();
        let _ = App::update(&mut state, Message::FileLoaded(seq, Ok(scene())));
        let _ = App::update(&mut state, Message::Analyze);
        let request_id = state.snapshot.request_id.unwrap();

        let result = AnalysisResult::new(7, 1000)
            .with_visualization(Visualization::from_png(b"\x89PNG\r\n\x1a\n"));
        let _ = App::update(
            &mut state,
            Message::AnalysisFinished(Completion {
                request_id,
                outcome: Ok(result),
            }),
        );
        assert_eq!(state.snapshot.phase, SessionPhase::Succeeded);
        assert!(state.visualization.is_some());
        assert_eq!(
            state.history.last().map(String::as_str),
            Some("scene.png: 7 anomalies / 1000 pixels (0.70%)")
        );
    }

    #[tokio::test]
    async fn failed_request_is_logged() {
        let mut state = app();
        let seq = state.next_pick();
        let _ = App::update(&mut state, Message::FileLoaded(seq, Ok(scene())));
        let _ = App::update(&mut state, Message::Analyze);
        let request_id = state.snapshot.request_id.unwrap();

        let _ = App::update(
            &mut state,
            Message::AnalysisFinished(Completion {
                request_id,
                outcome: Err(AnalyzeError::Server {
                    status: 400,
                    message: Some("unsupported format".into()),
                }),
            }),
        );
        assert_eq!(state.snapshot.error.as_deref(), Some("unsupported format"));
        assert!(state.visualization.is_none());
        assert_eq!(
            state.history.last().map(String::as_str),
            Some("scene.png failed: unsupported format")
        );
    }

    #[test]
    fn endpoint_edits_reach_the_snapshot() {
        let mut state = app();
        let _ = App::update(
            &mut state,
            Message::EndpointChanged("http://10.0.0.9:4000/api/detect-anomalies".into()),
        );
        assert_eq!(
            state.snapshot.endpoint,
            "http://10.0.0.9:4000/api/detect-anomalies"
        );
    }

    #[test]
    fn unreadable_file_leaves_session_untouched() {
        let mut state = app();
        let seq = state.next_pick();
        let _ = App::update(
            &mut state,
            Message::FileLoaded(seq, Err("/tmp/missing.png: not found".into())),
        );
        assert_eq!(state.snapshot.phase, SessionPhase::Idle);
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn slow_earlier_load_does_not_replace_later_pick() {
        let mut state = app();
        let first = state.next_pick();
        let second = state.next_pick();

        let later = SelectedFile::new("b.png", vec![9u8]);
        let earlier = SelectedFile::new("a.tif", vec![1u8, 2, 3, 4]);
        let _ = App::update(&mut state, Message::FileLoaded(second, Ok(later)));
        let _ = App::update(&mut state, Message::FileLoaded(first, Ok(earlier)));

        let file = state.snapshot.file.as_ref().unwrap();
        assert_eq!(file.name, "b.png");
        assert_eq!(file.size, 1);
        assert_eq!(state.history, vec!["Selected b.png".to_string()]);
    }

    #[test]
    fn superseded_load_error_is_not_reported() {
        let mut state = app();
        let first = state.next_pick();
        let _ = state.next_pick();
        let _ = App::update(
            &mut state,
            Message::FileLoaded(first, Err("/tmp/a.tif: permission denied".into())),
        );
        assert_eq!(state.snapshot.phase, SessionPhase::Idle);
        assert!(state.history.is_empty());
    }
}
