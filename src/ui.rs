use acdist::ProgressSink;
use iocraft::prelude::*;

#[derive(Default, Props)]
pub struct StepMessageProps {
    pub label: String,
}

#[component]
pub fn StepMessage(props: &StepMessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            Text(color: Color::Cyan, content: "◇ ")
            Text(content: props.label.clone())
        }
    }
}

/// Renders every upload step on its own line.
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn step(&self, label: &str) {
        element!(StepMessage(label: label.to_string())).print();
    }
}

#[derive(Default, Props)]
pub struct MessageProps {
    pub message: String,
}

#[component]
pub fn SuccessMessage(props: &MessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            Text(color: Color::Green, content: "◆ ")
            Text(content: props.message.clone())
        }
    }
}

#[component]
pub fn ErrorMessage(props: &MessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Row) {
            Text(color: Color::Red, content: "▲ ")
            Text(content: props.message.clone())
        }
    }
}

#[derive(Default, Props)]
pub struct ReleaseSummaryProps {
    pub release_id: String,
    pub release_url: Option<String>,
    pub destinations: Vec<String>,
    pub elapsed: String,
}

#[component]
pub fn ReleaseSummary(props: &ReleaseSummaryProps) -> impl Into<AnyElement<'static>> {
    let destinations = if props.destinations.is_empty() {
        "<none>".to_string()
    } else {
        props.destinations.join(", ")
    };

    element! {
        View(flex_direction: FlexDirection::Column) {
            View(flex_direction: FlexDirection::Row) {
                Text(color: Color::Green, content: "◆ ")
                Text(weight: Weight::Bold, content: format!("Release {} distributed in {}", props.release_id, props.elapsed))
            }
            Text(content: format!("│ Groups: {}", destinations))
            #(props.release_url.as_ref().map(|url| element! {
                Text(content: format!("└ {}", url))
            }))
        }
    }
}

#[component]
pub fn ConfigHeader() -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            Text(weight: Weight::Bold, content: "acdist configuration")
            Text(content: "Press enter to keep the value shown in brackets.")
        }
    }
}

#[derive(Default, Props)]
pub struct InputPromptProps {
    pub prompt: String,
    pub default: Option<String>,
    pub description: Option<String>,
}

#[component]
pub fn InputPrompt(props: &InputPromptProps) -> impl Into<AnyElement<'static>> {
    let prompt = match &props.default {
        Some(default) => format!("{} [{}]", props.prompt, default),
        None => props.prompt.clone(),
    };

    element! {
        View(flex_direction: FlexDirection::Column) {
            Text(weight: Weight::Bold, content: prompt)
            #(props.description.as_ref().map(|description| element! {
                Text(color: Color::DarkGrey, content: description.clone())
            }))
        }
    }
}
