use anyhow::Result;
use mentor_core::{MentorService, INTERACTIVE_SEARCH_TOP_K};
use std::io::{BufRead, Write};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

fn strip_command<'a>(line: &'a str, command: &str) -> Option<&'a str> {
    line.get(..command.len())
        .filter(|head| head.eq_ignore_ascii_case(command))
        .map(|_| line[command.len()..].trim())
}

pub fn run<R: BufRead, W: Write>(service: &MentorService, input: R, mut out: W) -> Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "MENTOR - Interactive Q&A Evaluation")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "\nCommands:")?;
    writeln!(out, "  - Type 'quit' to exit")?;
    writeln!(out, "  - Type 'search: <query>' to find similar questions")?;
    writeln!(out, "  - Or enter a question and answer separated by '|'")?;

    let mut lines = input.lines();
    loop {
        write!(out, "\nEnter question|answer (or command): ")?;
        out.flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let line = line.trim();

        if line.eq_ignore_ascii_case("quit") {
            writeln!(out, "Thank you for using Mentor!")?;
            break;
        }

        if let Some(query) = strip_command(line, "search:") {
            match service.search(query, Some(INTERACTIVE_SEARCH_TOP_K)) {
                Ok(results) => {
                    writeln!(out, "\nTop similar questions for: '{query}'")?;
                    writeln!(out, "{THIN_RULE}")?;
                    for (i, m) in results.iter().enumerate() {
                        writeln!(out, "\n{}. [{}] {}", i + 1, m.topic.to_uppercase(), m.question)?;
                        writeln!(out, "   Answer: {}", m.answer)?;
                        writeln!(out, "   Similarity: {:.2}%", m.similarity * 100.0)?;
                    }
                }
                Err(err) => writeln!(out, "error: {err}")?,
            }
            continue;
        }

        let Some((question, answer)) = line.split_once('|') else {
            writeln!(out, "Please use format: question|answer")?;
            continue;
        };

        match service.evaluate(question.trim(), answer.trim()) {
            Ok(result) => {
                writeln!(out, "\n{RULE}")?;
                writeln!(out, "EVALUATION RESULTS")?;
                writeln!(out, "{RULE}")?;
                writeln!(out, "Topic: {}", result.topic.to_uppercase())?;
                writeln!(out, "Matched Question: {}", result.matched_question)?;
                writeln!(
                    out,
                    "\nQuestion Match Score: {:.2}%",
                    result.question_match_score * 100.0
                )?;
                writeln!(out, "Answer Match Score: {:.2}%", result.answer_match_score * 100.0)?;
                writeln!(out, "Overall Score: {:.2}%", result.overall_score * 100.0)?;
                writeln!(out, "\nFeedback: {}", result.feedback)?;
                writeln!(out, "{RULE}")?;
            }
            Err(err) => writeln!(out, "error: {err}")?,
        }
    }

    Ok(())
}
