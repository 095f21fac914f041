use colored::Colorize;

use super::{Composer, ComposerRegistry, Pattern};
use crate::collector::{ContentMap, ContentType};
use crate::config::ComposerConfig;

fn value(content: &ContentMap, ty: ContentType) -> &str {
    content.get(&ty).map(|v| v.trim()).unwrap_or("")
}

/// Built-in fragments, followed by config composers (which may replace them).
pub fn registry(configured: &[ComposerConfig]) -> ComposerRegistry {
    use ContentType::*;

    let mut registry = ComposerRegistry::new();

    registry.register(Composer::custom("folder", &[Folder], |c| {
        let folder = value(c, Folder);
        if folder.is_empty() {
            String::new()
        } else {
            folder.bright_blue().bold().to_string()
        }
    }));

    registry.register(Composer::custom("git", &[GitBranch, GitStatus, GitRemote], |c| {
        let branch = value(c, GitBranch);
        if branch.is_empty() {
            return String::new();
        }
        let mut parts = vec![branch.green().to_string()];
        let status = value(c, GitStatus);
        if !status.is_empty() {
            parts.push(status.yellow().to_string());
        }
        let remote = value(c, GitRemote);
        if !remote.is_empty() {
            parts.push(remote.dimmed().to_string());
        }
        parts.join(" ")
    }));

    registry.register(Composer::first_match(
        "model-info",
        vec![
            Pattern::new(
                &[Model, TokenBar, TokenUsage, TokenPercent],
                &[],
                "{model} {token-bar} [{token-usage} ({token-percent})]",
            ),
            Pattern::new(
                &[Model, TokenBar, TokenUsage],
                &[],
                "{model} {token-bar} [{token-usage}]",
            ),
            Pattern::new(
                &[Model, TokenUsage, TokenPercent],
                &[],
                "{model} [{token-usage} ({token-percent})]",
            ),
            Pattern::new(&[Model, TokenUsage], &[], "{model} [{token-usage}]"),
            Pattern::new(&[Model], &[], "{model}"),
        ],
    ));

    registry.register(Composer::first_match(
        "tokens",
        vec![
            Pattern::new(
                &[TokenUsage, TokenPercent],
                &[],
                "{token-usage} ({token-percent})",
            ),
            Pattern::new(&[TokenUsage], &[], "{token-usage}"),
        ],
    ));

    registry.register(Composer::template("memory", &[MemoryFiles], "{memory-files} memory"));
    registry.register(Composer::template("todo", &[Todo], "todo {todo}"));
    registry.register(Composer::pass_through("session", &[SessionDuration]));
    registry.register(Composer::template("agents", &[Agents], "agents: {agents}"));

    registry.register(Composer::first_match(
        "quota",
        vec![
            Pattern::new(&[Quota, QuotaReset], &[], "5h {quota} ({quota-reset})"),
            Pattern::new(&[Quota], &[], "5h {quota}"),
        ],
    ));

    registry.register(Composer::pass_through("cost", &[Cost]));
    registry.register(Composer::pass_through("version", &[Version]));
    registry.register(Composer::template("style", &[OutputStyle], "style: {output-style}"));
    registry.register(Composer::pass_through("clock", &[Clock]));

    registry.extend_from_config(configured);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(pairs: &[(ContentType, &str)]) -> ContentMap {
        pairs.iter().map(|(t, v)| (*t, v.to_string())).collect()
    }

    #[test]
    fn test_tokens_fragment() {
        let r = registry(&[]);
        let c = content(&[
            (ContentType::TokenUsage, "55.0K/200K"),
            (ContentType::TokenPercent, "27.5%"),
        ]);
        assert_eq!(r.get("tokens").unwrap().compose(&c), "55.0K/200K (27.5%)");
    }

    #[test]
    fn test_model_info_degrades() {
        let r = registry(&[]);
        let full = content(&[
            (ContentType::Model, "Opus 4.5"),
            (ContentType::TokenBar, "###-------"),
            (ContentType::TokenUsage, "55.0K/200K"),
            (ContentType::TokenPercent, "27.5%"),
        ]);
        assert_eq!(
            r.get("model-info").unwrap().compose(&full),
            "Opus 4.5 ###------- [55.0K/200K (27.5%)]"
        );
        let no_percent = content(&[
            (ContentType::Model, "Opus 4.5"),
            (ContentType::TokenBar, "###-------"),
            (ContentType::TokenUsage, "55.0K/200K"),
        ]);
        assert_eq!(
            r.get("model-info").unwrap().compose(&no_percent),
            "Opus 4.5 ###------- [55.0K/200K]"
        );
        let no_bar = content(&[
            (ContentType::Model, "Opus 4.5"),
            (ContentType::TokenUsage, "55.0K/200K"),
            (ContentType::TokenPercent, "27.5%"),
        ]);
        assert_eq!(
            r.get("model-info").unwrap().compose(&no_bar),
            "Opus 4.5 [55.0K/200K (27.5%)]"
        );
        let bare = content(&[(ContentType::Model, "Claude")]);
        assert_eq!(r.get("model-info").unwrap().compose(&bare), "Claude");
    }

    #[test]
    fn test_git_fragment() {
        colored::control::set_override(false);
        let r = registry(&[]);
        let c = content(&[
            (ContentType::GitBranch, "main"),
            (ContentType::GitStatus, "+3 ~1"),
            (ContentType::GitRemote, ""),
        ]);
        assert_eq!(r.get("git").unwrap().compose(&c), "main +3 ~1");
        assert_eq!(r.get("git").unwrap().compose(&ContentMap::new()), "");
    }

    #[test]
    fn test_labelled_fragments_blank_without_input() {
        let r = registry(&[]);
        let fragments = r.compose_all(&ContentMap::new());
        for name in ["memory", "todo", "agents", "style", "quota", "session"] {
            assert_eq!(fragments[name], "", "{} should be blank", name);
        }
    }

    #[test]
    fn test_config_composer_overrides_builtin() {
        let r = registry(&[ComposerConfig {
            name: "cost".into(),
            inputs: vec!["cost".into()],
            template: "spent {cost}".into(),
            ..Default::default()
        }]);
        let c = content(&[(ContentType::Cost, "$0.42")]);
        assert_eq!(r.get("cost").unwrap().compose(&c), "spent $0.42");
    }
}
