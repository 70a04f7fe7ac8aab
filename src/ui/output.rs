use crate::ui::{theme, Icons};
use crate::{Edge, Node};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

/// `schema:id`, with the schema part colored
fn qualified(schema: &str, id: &str) -> String {
    format!("{}:{}", schema.style(theme().schema.clone()), id.style(theme().id.clone()))
}

pub fn node_line(node: &Node) {
    println!(
        "{} {} {}",
        Icons::NODE,
        qualified(node.schema().as_str(), node.id()),
        dim(&node.body().to_string())
    );
}

pub fn edge_line(edge: &Edge) {
    let properties = edge
        .properties()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "null".to_string());
    println!(
        "{} [{}] {} {} {} {}",
        Icons::LINK,
        edge.schema().as_str().style(theme().schema.clone()),
        qualified(edge.source_schema().as_str(), edge.source()),
        Icons::ARROW,
        qualified(edge.target_schema().as_str(), edge.target()),
        dim(&properties)
    );
}
