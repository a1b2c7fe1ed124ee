//! End-to-end request handling: task text + attachments in, ordered answer
//! list out. The one external contract that must never break is positional
//! alignment: N questions in, N answers out.

use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

use crate::chart::{self, LineStyle};
use crate::config::ScoutConfig;
use crate::error::{ScoutError, ScoutResult};
use crate::llm::Completion;
use crate::parse::{parse_answers, placeholder_answers, Answer, TaskSpec, TemplateKind};
use crate::table::{self, html, load, normalize_name, NormalizedTable, RawTable};
use crate::web::PageFetcher;

pub struct Orchestrator<'a> {
    config: &'a ScoutConfig,
    fetcher: &'a dyn PageFetcher,
    llm: &'a dyn Completion,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a ScoutConfig,
        fetcher: &'a dyn PageFetcher,
        llm: &'a dyn Completion,
    ) -> Self {
        Self { config, fetcher, llm }
    }

    /// Answer a task under the request's wall-clock budget. On expiry every
    /// outstanding fetch/render is dropped and the caller gets a timeout
    /// error rather than a hang.
    pub async fn answer(
        &self,
        task_text: &str,
        attachments: &[(String, Vec<u8>)],
    ) -> ScoutResult<Vec<Answer>> {
        let seconds = self.config.limits.hard_timeout_secs;
        tokio::time::timeout(
            Duration::from_secs(seconds),
            self.answer_inner(task_text, attachments),
        )
        .await
        .map_err(|_| ScoutError::Timeout { seconds })?
    }

    async fn answer_inner(
        &self,
        task_text: &str,
        attachments: &[(String, Vec<u8>)],
    ) -> ScoutResult<Vec<Answer>> {
        let task = TaskSpec::parse(task_text);
        if task.raw.trim().is_empty() {
            return Err(ScoutError::input("empty task description"));
        }
        info!(questions = task.questions.len(), urls = task.urls.len(), "task parsed");

        let working = self.working_table(&task, attachments).await?;

        let system_prompt = self.build_prompt(&task, working.as_ref());
        let completion = self.llm.complete(&system_prompt, "").await;

        let mut answers = match parse_answers(&completion, &task.template) {
            Ok(answers) => answers,
            Err(e) => {
                warn!(error = %e, "completion unparseable, substituting placeholders");
                placeholder_answers(task.questions.len())
            }
        };
        align_answers(&mut answers, task.questions.len());

        if let Some(table) = &working {
            self.answer_chart_questions(&task.questions, table, &mut answers);
        }

        Ok(answers)
    }

    /// Pick the working table: a fetched page wins over attachments, and
    /// among candidates numeric density decides. No sources at all is fine;
    /// the collaborator then answers from the task text alone.
    async fn working_table(
        &self,
        task: &TaskSpec,
        attachments: &[(String, Vec<u8>)],
    ) -> ScoutResult<Option<NormalizedTable>> {
        let sample = self.config.limits.classify_sample_rows;

        if let Some(url) = task.first_url() {
            let page = self.fetcher.fetch(url).await?;
            let tables = html::parse_tables(&page)?;
            let (index, table) = table::select_by_density(&tables, sample)?;
            info!(url, table = index, rows = table.row_count(), "working table from page");
            return Ok(Some(table));
        }

        let tables: Vec<RawTable> = attachments
            .iter()
            .filter_map(|(name, bytes)| load::load_attachment(name, bytes))
            .collect();
        if tables.is_empty() {
            return Ok(None);
        }
        let (index, table) = table::select_by_density(&tables, sample)?;
        info!(table = index, rows = table.row_count(), "working table from attachments");
        Ok(Some(table))
    }

    fn build_prompt(&self, task: &TaskSpec, table: Option<&NormalizedTable>) -> String {
        let head = self.config.limits.table_head_rows;
        let (columns, records) = match table {
            Some(t) => (json!(t.columns), t.head_records(head)),
            None => (json!([]), json!([])),
        };

        let shape = match &task.template {
            TemplateKind::Object(keys) if !keys.is_empty() => {
                format!("a single JSON object with exactly these keys: {}", keys.join(", "))
            }
            TemplateKind::Object(_) => "a single JSON object".to_string(),
            _ => "a single JSON array of answers, in the same order as the questions".to_string(),
        };

        format!(
            "You are a careful data analyst. Use the table provided to answer the questions.\n\
             - Respond with {shape}.\n\
             - Do NOT include markdown, code fences, or any text outside the JSON.\n\
             - Answer numeric questions with plain numbers.\n\
             - If a question asks for a plot or chart, answer it with the string \"chart\"; \
             it is rendered separately.\n\n\
             Table columns: {columns}\n\
             Table data (first {head} rows): {records}\n\
             Questions:\n{questions}\n",
            questions = json!(task.questions),
        )
    }

    /// Replace the answer to any question that asks for a plot of two known
    /// columns with a locally rendered regression scatter. A chart that
    /// cannot be rendered degrades that one answer, never the request.
    fn answer_chart_questions(
        &self,
        questions: &[String],
        table: &NormalizedTable,
        answers: &mut [Answer],
    ) {
        for (i, question) in questions.iter().enumerate() {
            if !wants_plot(question) {
                continue;
            }
            let Some((x_col, y_col)) = chart_columns(question, table) else {
                // The collaborator answers plot questions with a sentinel
                // string; an unrenderable plot must not leak it out.
                if is_chart_sentinel(&answers[i]) {
                    warn!(question = i + 1, "plot question names no known columns, degrading answer");
                    answers[i] = Answer::Text(format!("(Failed to answer question {})", i + 1));
                }
                continue;
            };

            let style = if question.to_lowercase().contains("dotted")
                && question.to_lowercase().contains("red")
            {
                LineStyle::DottedRed
            } else {
                LineStyle::Solid
            };

            let x = table.numeric_column(x_col);
            let y = table.numeric_column(y_col);
            match chart::render(
                &x,
                &y,
                &table.columns[x_col],
                &table.columns[y_col],
                style,
                &self.config.chart,
            ) {
                Ok(image) => {
                    if image.truncated {
                        warn!(question = i + 1, "chart was truncated to fit the size budget");
                    }
                    info!(
                        question = i + 1,
                        bytes = image.bytes.len(),
                        mime = image.mime.as_str(),
                        "answered question with rendered chart"
                    );
                    answers[i] = Answer::Text(image.to_data_uri());
                }
                Err(e) => {
                    warn!(question = i + 1, error = %e, "chart rendering failed, degrading answer");
                    answers[i] = Answer::Text(format!("(Failed to answer question {})", i + 1));
                }
            }
        }
    }
}

/// A question that asks for any kind of plot.
fn wants_plot(question: &str) -> bool {
    let lower = question.to_lowercase();
    ["scatterplot", "scatter plot", "plot", "chart", "graph"]
        .iter()
        .any(|kw| lower.contains(kw))
}

/// The string the prompt tells the collaborator to answer plot questions
/// with; it is replaced locally and must never reach the caller.
fn is_chart_sentinel(answer: &Answer) -> bool {
    matches!(answer, Answer::Text(s) if s.trim().eq_ignore_ascii_case("chart"))
}

/// First two of the working table's columns the question names, ordered by
/// position of mention in the question text.
fn chart_columns(question: &str, table: &NormalizedTable) -> Option<(usize, usize)> {
    // Normalized-name boundary match against the normalized question text.
    let haystack = format!("_{}_", normalize_name(question));
    let mut mentioned: Vec<(usize, usize)> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_empty())
        .filter_map(|(idx, c)| haystack.find(&format!("_{c}_")).map(|pos| (pos, idx)))
        .collect();
    mentioned.sort();
    mentioned.dedup_by_key(|(_, idx)| *idx);

    if mentioned.len() >= 2 {
        Some((mentioned[0].1, mentioned[1].1))
    } else {
        None
    }
}

/// Enforce the 1:1 length contract against a miscounted completion.
fn align_answers(answers: &mut Vec<Answer>, expected: usize) {
    if answers.len() == expected {
        return;
    }
    warn!(got = answers.len(), expected, "answer count mismatch, realigning");
    while answers.len() < expected {
        let n = answers.len() + 1;
        answers.push(Answer::Text(format!("(Failed to answer question {n})")));
    }
    answers.truncate(expected);
}
