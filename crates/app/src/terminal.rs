//! Line-oriented presentation of the assessment and tutor flows.

use std::io;
use std::sync::Arc;

use edutrack_core::Countdown;
use edutrack_core::assessment::{Advance, AssessmentSnapshot, AssessmentSummary};
use edutrack_core::model::{ChatRole, QuestionBank, Student};
use services::{
    ApiKey, AssessmentEngine, AssessmentSettings, Clock, EngineEvent, ExplanationGateway,
    SUGGESTIONS, TutorConversation, TutorError,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

fn stdin_lines() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuizInput {
    Select(usize),
    Submit,
    Next,
    Timer,
    Quit,
    Unknown,
}

fn parse_quiz_input(line: &str) -> QuizInput {
    let line = line.trim();
    if let Ok(number) = line.parse::<usize>() {
        return match number.checked_sub(1) {
            Some(index) => QuizInput::Select(index),
            None => QuizInput::Unknown,
        };
    }
    match line.to_lowercase().as_str() {
        "v" | "valider" => QuizInput::Submit,
        "s" | "suivant" | "" => QuizInput::Next,
        "t" | "temps" => QuizInput::Timer,
        "q" | "quitter" => QuizInput::Quit,
        _ => QuizInput::Unknown,
    }
}

fn progress_bar(percent: u32) -> String {
    const WIDTH: usize = 20;
    let filled = (percent.min(100) as usize * WIDTH) / 100;
    format!(
        "[{}{}] {percent} %",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled)
    )
}

fn render_question(engine: &AssessmentEngine) {
    let snap = engine.snapshot();
    let question = engine.current_question();
    println!();
    println!(
        "[{}] Question {} / {}  ·  difficulté adaptative: {:.2}  ·  {}",
        question.subject(),
        snap.current_index + 1,
        snap.question_count,
        snap.theta,
        Countdown::new(snap.remaining_secs).display()
    );
    println!("{}", progress_bar(snap.progress_percent()));
    println!("{}", question.content());
    for (idx, option) in question.options().iter().enumerate() {
        let marker = if snap.selected_option == Some(idx) { '>' } else { ' ' };
        println!(" {marker} {}. {option}", idx + 1);
    }
    println!("(numéro = choisir, v = valider, q = quitter)");
}

fn render_feedback(snap: &AssessmentSnapshot) {
    match snap.last_answer_correct {
        Some(true) => println!("Excellent !"),
        Some(false) if snap.loading_explanation => println!("L'IA analyse ton erreur..."),
        Some(false) => {
            println!("Explication IA :");
            if let Some(text) = &snap.explanation_text {
                println!("  {text}");
            }
        }
        None => {}
    }
    if snap.submitted && !snap.loading_explanation {
        let next = if snap.is_last_question() { "Terminer" } else { "Suivant" };
        println!("(s = {next})");
    }
}

fn render_summary(summary: &AssessmentSummary) {
    println!();
    println!(
        "Évaluation terminée : {} / {} · theta final {:.2}",
        summary.score, summary.total_questions, summary.theta
    );
    for tally in &summary.by_subject {
        println!(
            "  {:<10} {} / {} ({} %)",
            tally.subject.label(),
            tally.correct,
            tally.answered,
            tally.percent()
        );
    }
}

/// Run one assessment until completion, quit, or end of input.
pub async fn run_assessment(
    bank: Arc<QuestionBank>,
    gateway: ExplanationGateway,
    credential: Option<ApiKey>,
    settings: AssessmentSettings,
) -> io::Result<()> {
    let mut engine = AssessmentEngine::start(bank, gateway, credential, settings);
    let mut input = stdin_lines();
    render_question(&engine);

    loop {
        tokio::select! {
            Some(event) = engine.next_event() => match event {
                EngineEvent::Ticked { remaining_secs: 0 } => println!("Temps écoulé !"),
                EngineEvent::Ticked { remaining_secs } if remaining_secs % 60 == 0 => {
                    println!("Temps restant : {}", Countdown::new(remaining_secs).display());
                }
                EngineEvent::Ticked { .. } => {}
                EngineEvent::ExplanationReady { .. } => render_feedback(&engine.snapshot()),
            },
            line = input.next_line() => {
                let Some(line) = line? else { break };
                match parse_quiz_input(&line) {
                    QuizInput::Select(index) => {
                        if engine.select_option(index).is_ok() {
                            render_question(&engine);
                        }
                    }
                    QuizInput::Submit => {
                        if engine.submit().is_ok() {
                            render_feedback(&engine.snapshot());
                        }
                    }
                    QuizInput::Next => match engine.advance() {
                        Ok(Advance::Next { .. }) => render_question(&engine),
                        Ok(Advance::Completed) => {
                            render_summary(&engine.summary());
                            break;
                        }
                        Err(_) => {}
                    },
                    QuizInput::Timer => {
                        println!("Temps restant : {}", engine.session().countdown().display());
                    }
                    QuizInput::Quit => break,
                    QuizInput::Unknown => println!("Commande inconnue."),
                }
            }
        }
    }

    engine.teardown();
    Ok(())
}

/// Run a tutor conversation until quit or end of input.
pub async fn run_tutor(
    student: &Student,
    gateway: &ExplanationGateway,
    credential: Option<&ApiKey>,
    clock: Clock,
) -> io::Result<()> {
    let mut convo = TutorConversation::new(student, clock);
    let mut input = stdin_lines();

    for message in convo.messages() {
        println!("EduTrack: {}", message.text);
    }
    println!("Suggestions :");
    for suggestion in SUGGESTIONS {
        println!("  - {suggestion}");
    }

    while let Some(line) = input.next_line().await? {
        if matches!(line.trim(), "q" | "quitter") {
            break;
        }
        match convo.send(gateway, credential, &line).await {
            Ok(reply) => {
                let who = match reply.role {
                    ChatRole::Tutor => "EduTrack",
                    ChatRole::Student => "Toi",
                };
                println!("{who}: {}", reply.text);
            }
            Err(TutorError::EmptyMessage) => {}
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_select_one_based_options() {
        assert_eq!(parse_quiz_input("1"), QuizInput::Select(0));
        assert_eq!(parse_quiz_input(" 4 "), QuizInput::Select(3));
        assert_eq!(parse_quiz_input("0"), QuizInput::Unknown);
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0), "[--------------------] 0 %");
        assert_eq!(progress_bar(40), "[########------------] 40 %");
        assert_eq!(progress_bar(100), "[####################] 100 %");
    }

    #[test]
    fn words_map_to_actions() {
        assert_eq!(parse_quiz_input("V"), QuizInput::Submit);
        assert_eq!(parse_quiz_input(""), QuizInput::Next);
        assert_eq!(parse_quiz_input("temps"), QuizInput::Timer);
        assert_eq!(parse_quiz_input("q"), QuizInput::Quit);
        assert_eq!(parse_quiz_input("bonjour"), QuizInput::Unknown);
    }
}
