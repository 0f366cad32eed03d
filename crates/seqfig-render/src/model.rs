use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A participant lane. `label` may span several lines (`\n`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub x: f64,
    pub label: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, x: f64, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Call,
    Return,
}

impl MessageKind {
    pub fn is_return(self) -> bool {
        matches!(self, Self::Return)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Return => "return",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub kind: MessageKind,
    pub label: String,
    /// Second label line. Only calls show it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Message {
    pub fn call(
        from: impl Into<String>,
        to: impl Into<String>,
        label: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: MessageKind::Call,
            label: label.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn reply(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: MessageKind::Return,
            label: label.into(),
            detail: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Step {
    Message(Message),
    /// Extra vertical offset separating two groups of messages.
    GroupGap,
}

/// Keys actors by id, keeping declaration order. Ids must be unique.
pub fn index_actors(actors: &[Actor]) -> Result<IndexMap<&str, &Actor>> {
    let mut out = IndexMap::with_capacity(actors.len());
    for actor in actors {
        if out.insert(actor.id.as_str(), actor).is_some() {
            return Err(Error::DuplicateActor {
                actor: actor.id.clone(),
            });
        }
    }
    Ok(out)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub actors: Vec<Actor>,
    /// Actor whose lane carries the prompt annotation and the continuation marker.
    pub focus: String,
    #[serde(default)]
    pub prompt: Option<String>,
    pub steps: Vec<Step>,
    #[serde(default = "default_true")]
    pub continuation: bool,
}

impl Scenario {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.steps.iter().filter_map(|s| match s {
            Step::Message(m) => Some(m),
            Step::GroupGap => None,
        })
    }

    /// Actors keyed by id, in declaration order.
    pub fn actor_map(&self) -> Result<IndexMap<&str, &Actor>> {
        index_actors(&self.actors)
    }

    /// The researcher agent resolving `DefaultParser.parse`: four class lookups against the
    /// Javadoc server, then a method lookup and a package listing.
    pub fn research_phase() -> Self {
        let docs = |class: &str| {
            [
                Step::Message(Message::call(
                    "researcher",
                    "javadoc",
                    "get_class_documentation",
                    class,
                )),
                Step::Message(Message::reply(
                    "javadoc",
                    "researcher",
                    if class == "ParseException" {
                        "exception docs"
                    } else {
                        "class methods & docs"
                    },
                )),
            ]
        };

        let mut steps = Vec::with_capacity(13);
        for class in ["DefaultParser", "Options", "CommandLine", "ParseException"] {
            steps.extend(docs(class));
        }
        steps.push(Step::GroupGap);
        steps.extend([
            Step::Message(Message::call(
                "researcher",
                "codecontext",
                "get_method_code",
                "parse(Options, String[])",
            )),
            Step::Message(Message::reply(
                "codecontext",
                "researcher",
                "2 implementations",
            )),
            Step::Message(Message::call(
                "researcher",
                "javadoc",
                "list_classes",
                "org.apache.commons.cli",
            )),
            Step::Message(Message::reply("javadoc", "researcher", "package classes")),
        ]);

        Self {
            actors: vec![
                Actor::new("javadoc", 0.4, "Javadoc\nMCP"),
                Actor::new("researcher", 1.5, "Researcher"),
                Actor::new("codecontext", 2.6, "CodeContext\nMCP"),
            ],
            focus: "researcher".to_string(),
            prompt: Some("Initial prompt".to_string()),
            steps,
            continuation: true,
        }
    }
}
