//! The interactive terminal loop.
//!
//! Reads commands from the shared input, drives the session controller and
//! the voice capture, and redraws the current screen after every action.
//! While a request is outstanding the loop keeps reading input: a reset or a
//! key change is applied at once, and a published analysis is shown before
//! its image arrives.

use std::collections::HashMap;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use console::{style, Term};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use oneiric_audio::{Microphone, SpectrumFrame};
use oneiric_core::config::UiConfig;
use oneiric_core::{ChatMessage, Recording, Role};
use oneiric_gemini::{DreamInput, InterpretationService};
use oneiric_session::{
    AnalysisEntry, AnalysisOutcome, Confirmer, CredentialProvider, ImageStatus, LinePrompt,
    Notifier, SessionController, TurnOutcome,
};
use oneiric_ui::compose::PLACEHOLDER_TRANSCRIBING;
use oneiric_ui::screen::{render_chat_header, render_gate, GATE_ACTION};
use oneiric_ui::{
    render_bars, AnalysisView, ComposeState, MessageList, Screen, VoiceCapture, VoiceOutcome,
};

use crate::commands::{self, Command, HELP};
use crate::images::save_image;
use crate::terminal::InputLines;

pub const VOICE_UNAVAILABLE_NOTICE: &str = "Голосовой ввод недоступен в этой сборке.";
pub const RECORDING_LIMIT_NOTICE: &str = "Достигнута максимальная длительность записи.";
pub const NOTHING_TO_ANALYZE_NOTICE: &str =
    "Нечего анализировать: опишите сон или запишите его голосом.";
pub const ANALYSIS_FAILED_NOTICE: &str = "Не удалось проанализировать сон. Попробуйте ещё раз.";
pub const IMAGE_SAVE_FAILED_NOTICE: &str = "Не удалось сохранить визуализацию.";

const ANALYZING: &str = "Анализ сна...";
const BUSY: &str = "Дождитесь ответа: запрос ещё выполняется.";
const BARS_WIDTH: usize = 40;
const LIMIT_CHECK: Duration = Duration::from_millis(250);
const REQUEST_POLL: Duration = Duration::from_millis(100);

/// How waiting on an outstanding request ended.
enum Waited<T> {
    Done(T),
    /// Input closed or the user quit; the request was abandoned.
    Quit,
}

/// Terminal front end over one [`SessionController`].
pub struct App<S, P, M, C> {
    service: Arc<S>,
    controller: Arc<SessionController<Arc<S>, P>>,
    voice: Option<VoiceCapture<M>>,
    input: Arc<InputLines>,
    confirmer: C,
    notifier: Arc<dyn Notifier>,
    compose: ComposeState,
    list: MessageList,
    width: usize,
    image_dir: PathBuf,
    saved_images: HashMap<usize, PathBuf>,
    /// Analyses already printed, and whether their image had settled then.
    rendered: HashMap<usize, bool>,
    quitting: bool,
    term: Term,
}

impl<S, P, M, C> App<S, P, M, C>
where
    S: InterpretationService,
    P: CredentialProvider,
    M: Microphone,
    C: Confirmer,
{
    pub fn new(
        service: Arc<S>,
        controller: SessionController<Arc<S>, P>,
        input: Arc<InputLines>,
        confirmer: C,
        notifier: Arc<dyn Notifier>,
        ui: &UiConfig,
        image_dir: PathBuf,
    ) -> Self {
        let term = Term::stdout();
        let rows = term.size().0 as usize;
        let width = ui.transcript_width.max(20);
        Self {
            service,
            controller: Arc::new(controller),
            voice: None,
            input,
            confirmer,
            notifier,
            compose: ComposeState::new(),
            list: MessageList::new(width, rows.saturating_sub(6).max(5)),
            width,
            image_dir,
            saved_images: HashMap::new(),
            rendered: HashMap::new(),
            quitting: false,
            term,
        }
    }

    /// Enable `/rec` and `/dream`.
    pub fn with_voice(mut self, voice: VoiceCapture<M>) -> Self {
        self.voice = Some(voice);
        self
    }

    pub fn controller(&self) -> &Arc<SessionController<Arc<S>, P>> {
        &self.controller
    }

    pub fn compose(&self) -> &ComposeState {
        &self.compose
    }

    /// Run until `/quit` or end of input.
    pub async fn run(&mut self) {
        let state = self.controller.probe_credentials().await;
        info!(state = %state, "Credential probe finished");
        self.redraw();

        loop {
            let screen = Screen::for_state(self.controller.api_key_state());
            let prompt = match screen {
                Screen::Chat => format!("{} › ", self.compose.placeholder()),
                _ => "› ".to_string(),
            };
            let Some(line) = self.input.prompt_line(&prompt).await else {
                debug!("Input closed");
                break;
            };

            let command = commands::parse(&line);
            if command == Command::Quit {
                break;
            }
            match screen {
                Screen::Chat => self.handle_chat(command).await,
                Screen::Gate | Screen::Blank => self.handle_gate(command).await,
            }
            if self.quitting {
                break;
            }
        }

        if let Some(voice) = self.voice.as_mut() {
            voice.cancel(&mut self.compose);
        }
        info!("Session ended");
    }

    async fn handle_gate(&mut self, command: Command) {
        match command {
            Command::SelectKey => self.select_key().await,
            Command::Help => println!("{}", HELP),
            _ => println!("{}", style(GATE_ACTION).cyan()),
        }
    }

    async fn handle_chat(&mut self, command: Command) {
        match command {
            Command::Text(text) => {
                if self.compose.text().is_empty() {
                    self.compose.set_text(text);
                } else {
                    self.compose.merge_transcription(&text);
                }
                self.submit().await;
            }
            Command::Submit => self.submit().await,
            Command::Record => self.record().await,
            Command::RecordDream => self.record_dream().await,
            Command::Analyze => self.analyze().await,
            Command::New => self.new_conversation().await,
            Command::ChangeKey => self.change_key().await,
            Command::SelectKey => {
                println!("Ключ уже выбран. Используйте /key, чтобы сменить его.");
            }
            Command::Help => println!("{}", HELP),
            Command::Unknown(word) => {
                println!("Неизвестная команда {}\n{}", word, HELP);
            }
            Command::Quit => {}
        }
    }

    /// Input accepted while a request is outstanding. Returns false to quit.
    async fn handle_busy(&mut self, command: Command) -> bool {
        match command {
            Command::New => self.new_conversation().await,
            Command::ChangeKey => self.change_key().await,
            Command::Quit => return false,
            Command::Text(text) => {
                self.compose.merge_transcription(&text);
                println!("{} {}", style(BUSY).dim(), style("Текст сохранён в черновике.").dim());
            }
            Command::Help => println!("{}", HELP),
            Command::Unknown(word) => println!("Неизвестная команда {}", word),
            _ => println!("{}", style(BUSY).dim()),
        }
        true
    }

    async fn new_conversation(&mut self) {
        if self.controller.reset(&self.confirmer).await {
            self.saved_images.clear();
            self.rendered.clear();
            self.redraw();
        }
    }

    async fn change_key(&mut self) {
        match self.controller.change_credentials(&self.confirmer).await {
            Ok(true) => self.redraw(),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Key change rejected"),
        }
    }

    /// Drive `request` while still reading input and showing analyses as
    /// they are published.
    async fn wait_for<T>(&mut self, request: impl Future<Output = T>) -> Waited<T> {
        tokio::pin!(request);
        let input = Arc::clone(&self.input);
        let mut poll = tokio::time::interval(REQUEST_POLL);
        loop {
            tokio::select! {
                biased;
                result = &mut request => return Waited::Done(result),
                line = input.next_line() => {
                    let Some(line) = line else {
                        debug!("Input closed during a request");
                        self.quitting = true;
                        return Waited::Quit;
                    };
                    if !self.handle_busy(commands::parse(&line)).await {
                        self.quitting = true;
                        return Waited::Quit;
                    }
                }
                _ = poll.tick() => {}
            }
            self.show_analyses();
        }
    }

    async fn select_key(&mut self) {
        match self.controller.select_credentials().await {
            Ok(state) => debug!(state = %state, "Key selection finished"),
            Err(e) => warn!(error = %e, "Key selection rejected"),
        }
        self.redraw();
    }

    async fn submit(&mut self) {
        if !self.compose.can_submit(self.controller.is_processing()) {
            return;
        }
        let Some(text) = self.compose.take_submission() else {
            return;
        };

        let mut preview = self.controller.snapshot().history;
        preview.push(ChatMessage::user(text.clone()));
        self.draw_chat(&preview, true);

        let controller = Arc::clone(&self.controller);
        let message = text.clone();
        let request = async move { controller.send_message(&message).await };
        match self.wait_for(request).await {
            Waited::Done(Ok(TurnOutcome::Replied(reply))) => {
                debug!(len = reply.len(), "Reply received")
            }
            Waited::Done(Ok(outcome)) => debug!(?outcome, "Turn finished without a reply"),
            Waited::Done(Err(e)) => {
                warn!(error = %e, "Message not sent");
                self.compose.set_text(text);
            }
            Waited::Quit => return,
        }
        self.redraw();
    }

    /// Record until Enter or the duration cap, drawing the spectrum.
    ///
    /// The microphone is released before this returns.
    async fn capture(&mut self) -> Option<Recording> {
        let processing = self.controller.is_processing();
        let Some(voice) = self.voice.as_mut() else {
            self.notifier.notify(VOICE_UNAVAILABLE_NOTICE);
            return None;
        };
        voice
            .start(&mut self.compose, processing, self.notifier.as_ref())
            .await
            .ok()?;

        println!(
            "{} {}",
            style(self.compose.placeholder()).red().bold(),
            style("(Enter - остановить)").dim()
        );
        let mut frames = voice.frames();
        let mut limit_check = tokio::time::interval(LIMIT_CHECK);
        loop {
            tokio::select! {
                _ = self.input.next_line() => break,
                Some(frame) = next_frame(&mut frames) => {
                    print!("\r{}", style(render_bars(&frame, BARS_WIDTH)).magenta());
                    let _ = std::io::stdout().flush();
                }
                _ = limit_check.tick() => {
                    if voice.limit_reached() {
                        self.notifier.notify(RECORDING_LIMIT_NOTICE);
                        break;
                    }
                }
            }
        }
        println!();
        voice.stop_recording(&mut self.compose, self.notifier.as_ref())
    }

    /// `/rec`: dictate into the compose field.
    async fn record(&mut self) {
        let Some(recording) = self.capture().await else {
            return;
        };
        let Some(voice) = self.voice.as_ref() else {
            return;
        };
        println!("{}", style(PLACEHOLDER_TRANSCRIBING).dim());
        let outcome = voice
            .transcribe_into(
                self.service.as_ref(),
                recording,
                &mut self.compose,
                self.notifier.as_ref(),
            )
            .await;
        match outcome {
            VoiceOutcome::Merged(_) => self.redraw(),
            VoiceOutcome::NoSpeech => println!("{}", style("Речь не распознана.").dim()),
            VoiceOutcome::CredentialRejected => {
                self.controller.credential_rejected();
                self.redraw();
            }
            VoiceOutcome::Failed | VoiceOutcome::NotRecording => {}
        }
    }

    /// `/dream`: send the spoken dream straight to analysis.
    async fn record_dream(&mut self) {
        let Some(recording) = self.capture().await else {
            return;
        };
        self.run_analysis(DreamInput::Audio(recording)).await;
    }

    async fn analyze(&mut self) {
        let from_draft = self.compose.take_submission();
        let text = match from_draft.clone() {
            Some(text) => text,
            None => match last_user_message(&self.controller.snapshot().history) {
                Some(text) => text,
                None => {
                    self.notifier.notify(NOTHING_TO_ANALYZE_NOTICE);
                    return;
                }
            },
        };

        if !self.run_analysis(DreamInput::Text(text)).await {
            if let Some(draft) = from_draft {
                self.compose.set_text(draft);
            }
        }
    }

    /// Returns false when the session refused to start the analysis.
    async fn run_analysis(&mut self, input: DreamInput) -> bool {
        println!("{}", style(ANALYZING).dim());
        let controller = Arc::clone(&self.controller);
        let request = async move { controller.analyze(input).await };
        match self.wait_for(request).await {
            Waited::Done(Ok(AnalysisOutcome::Completed(index))) => {
                debug!(index, "Analysis completed");
                self.show_analyses();
            }
            Waited::Done(Ok(AnalysisOutcome::Failed(e))) => {
                debug!(error = %e, "Analysis failed");
                self.notifier.notify(ANALYSIS_FAILED_NOTICE);
            }
            Waited::Done(Ok(AnalysisOutcome::CredentialRejected)) => self.redraw(),
            Waited::Done(Ok(AnalysisOutcome::Discarded)) | Waited::Quit => {}
            Waited::Done(Err(e)) => {
                warn!(error = %e, "Analysis not started");
                return false;
            }
        }
        true
    }

    /// Print analyses not shown yet, and again once a pending image settles.
    fn show_analyses(&mut self) {
        let snapshot = self.controller.snapshot();
        for (index, entry) in snapshot.analyses.iter().enumerate() {
            let settled = entry.image != ImageStatus::Pending;
            if self
                .rendered
                .get(&index)
                .is_some_and(|&done| done || !settled)
            {
                continue;
            }
            self.show_analysis(index, entry);
            self.rendered.insert(index, settled);
        }
    }

    fn show_analysis(&mut self, index: usize, entry: &AnalysisEntry) {
        if let ImageStatus::Ready(image) = &entry.image {
            if !self.saved_images.contains_key(&index) {
                match save_image(&self.image_dir, image) {
                    Ok(path) => {
                        self.saved_images.insert(index, path);
                    }
                    Err(e) => {
                        warn!(error = %e, dir = %self.image_dir.display(), "Failed to save image");
                        self.notifier.notify(IMAGE_SAVE_FAILED_NOTICE);
                    }
                }
            }
        }

        let mut view = AnalysisView::new(entry);
        if let Some(path) = self.saved_images.get(&index) {
            view = view.with_image_path(path);
        }
        println!("\n{}", view.render(self.width));
    }

    fn redraw(&mut self) {
        let snapshot = self.controller.snapshot();
        match Screen::for_state(snapshot.api_key) {
            Screen::Blank => {}
            Screen::Gate => {
                let _ = self.term.clear_screen();
                println!("{}", render_gate(self.width));
            }
            Screen::Chat => self.draw_chat(&snapshot.history, snapshot.processing),
        }
    }

    fn draw_chat(&mut self, history: &[ChatMessage], processing: bool) {
        let _ = self.term.clear_screen();
        println!("{}", render_chat_header());
        for line in self.list.render(history, processing) {
            println!("{}", line);
        }
        if !self.compose.text().is_empty() {
            println!("{} {}", style("Черновик:").dim(), self.compose.text());
        }
    }
}

fn last_user_message(history: &[ChatMessage]) -> Option<String> {
    history
        .iter()
        .rev()
        .find(|m| m.role() == Role::User)
        .map(|m| m.text().to_string())
}

/// Next visualiser frame; pends forever once there is nothing to show.
async fn next_frame(
    frames: &mut Option<watch::Receiver<SpectrumFrame>>,
) -> Option<SpectrumFrame> {
    let Some(rx) = frames else {
        return std::future::pending().await;
    };
    if rx.changed().await.is_err() {
        return std::future::pending().await;
    }
    Some(rx.borrow_and_update().clone())
}
