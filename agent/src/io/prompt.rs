//! Prompt rendering for the task library.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::relevance::ResultPool;
use crate::core::types::{PageContent, PromptMode};

const IDENTIFY_TOPICS_TEMPLATE: &str = include_str!("prompts/identify_topics.md");
const TRANSLATE_TEMPLATE: &str = include_str!("prompts/translate.md");
const SEARCH_QUERY_TEMPLATE: &str = include_str!("prompts/search_query.md");
const SELECT_RESULTS_TEMPLATE: &str = include_str!("prompts/select_results.md");
const TRAVEL_AGENT_TEMPLATE: &str = include_str!("prompts/travel_agent.md");

const REQUIREMENTS_PERSONA: &str = include_str!("prompts/requirements_persona.md");
const CRITIC_PERSONA: &str = include_str!("prompts/critic_persona.md");
const TRAVEL_PERSONA: &str = include_str!("prompts/travel_persona.md");

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("identify_topics", IDENTIFY_TOPICS_TEMPLATE)
            .expect("identify_topics template should be valid");
        env.add_template("translate", TRANSLATE_TEMPLATE)
            .expect("translate template should be valid");
        env.add_template("search_query", SEARCH_QUERY_TEMPLATE)
            .expect("search_query template should be valid");
        env.add_template("select_results", SELECT_RESULTS_TEMPLATE)
            .expect("select_results template should be valid");
        env.add_template("travel_agent", TRAVEL_AGENT_TEMPLATE)
            .expect("travel_agent template should be valid");
        Self { env }
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        template
            .render(ctx)
            .with_context(|| format!("render {name} prompt"))
    }
}

static ENGINE: LazyLock<PromptEngine> = LazyLock::new(PromptEngine::new);

pub fn requirements_persona() -> &'static str {
    REQUIREMENTS_PERSONA.trim()
}

pub fn critic_persona() -> &'static str {
    CRITIC_PERSONA.trim()
}

pub fn travel_persona() -> &'static str {
    TRAVEL_PERSONA.trim()
}

pub fn identify_topics(text: &str) -> Result<String> {
    ENGINE.render("identify_topics", context! { text => text.trim() })
}

pub fn translate(text: &str, language: &str) -> Result<String> {
    ENGINE.render(
        "translate",
        context! { text => text.trim(), language => language.trim() },
    )
}

pub fn search_query(
    goal: &str,
    context_message: &str,
    topics: &[String],
    previous_queries: &[String],
) -> Result<String> {
    let previous_queries =
        serde_json::to_string(previous_queries).context("serialize previous queries")?;
    ENGINE.render(
        "search_query",
        context! {
            previous_queries => previous_queries,
            context => context_message.trim(),
            topics => topics,
            goal => goal.trim(),
        },
    )
}

pub fn select_results(goal: &str, context_message: &str, pool: &ResultPool) -> Result<String> {
    let results = serde_json::to_string(pool.entries()).context("serialize result pool")?;
    ENGINE.render(
        "select_results",
        context! {
            results => results,
            context => context_message.trim(),
            goal => goal.trim(),
        },
    )
}

pub fn travel_agent(
    goal: &str,
    context_message: &str,
    background: &str,
    mode: PromptMode,
    pages: &[PageContent],
) -> Result<String> {
    let pages = serde_json::to_string(pages).context("serialize page contents")?;
    ENGINE.render(
        "travel_agent",
        context! {
            background => background.trim(),
            context => context_message.trim(),
            pages => pages,
            goal => goal.trim(),
            mode => mode.as_str(),
        },
    )
}
