//! Story markdown parsing.
//!
//! Turns the raw text of a story file into a [`Story`]. The only hard failure is a
//! missing `# Story E.S: Title` header; every other section degrades to an empty value.

use super::keys::parse_story_key;
use super::{AcceptanceCriterion, Story, StoryStatusValue, StorySubtask, StoryTask};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#[ \t]+Story[ \t]+(\d+)\.(\d+)([a-z])?:[ \t]*(.+?)[ \t]*$").unwrap());
static STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Status:[ \t]*(.+?)[ \t]*$").unwrap());
static USER_STORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\bAs\s+an?\s+.+?,\s*I\s+want\s+.+?,\s*so\s+that\s+.+?\.").unwrap()
});
static SECTION_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"^##\s").unwrap());
static AC_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^##\s+Acceptance Criteria\s*$").unwrap());
static TASKS_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^##\s+Tasks(?:\s*/\s*Subtasks)?\s*$").unwrap());
static AC_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.\s+\*\*(.+?)\*\*(.*)$").unwrap());
static TASK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s+\[([ xX])\]\s+Task\s+(\d+):\s*(.*?)\s*$").unwrap());
static SUBTASK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+-\s+\[([ xX])\]\s+(\d+)\.(\d+):?\s*(.*?)\s*$").unwrap());
static AC_REFS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(AC:?\s*([^)]*)\)\s*$").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse a story markdown file. Returns `None` when no story header is present.
pub fn parse_story_content(content: &str, file_path: &str) -> Option<Story> {
    let normalized = content.replace("\r\n", "\n");
    let body = strip_frontmatter(&normalized);

    let Some(header) = HEADER.captures(body) else {
        tracing::debug!("No story header found in {}", file_path);
        return None;
    };
    let epic_number: u32 = header[1].parse().ok()?;
    let story_number: u32 = header[2].parse().ok()?;
    let story_suffix = header.get(3).and_then(|m| m.as_str().chars().next());
    let title = header[4].to_string();

    let status = STATUS
        .captures(body)
        .and_then(|caps| StoryStatusValue::parse(&caps[1]))
        .unwrap_or_default();

    let user_story = USER_STORY
        .find(body)
        .map(|m| WHITESPACE.replace_all(m.as_str().trim(), " ").into_owned())
        .unwrap_or_default();

    let acceptance_criteria = section_lines(body, &AC_HEADING)
        .map(|lines| parse_acceptance_criteria(&lines))
        .unwrap_or_default();

    let tasks = section_lines(body, &TASKS_HEADING)
        .map(|lines| parse_tasks(&lines))
        .unwrap_or_default();

    let key = derive_key(file_path, epic_number, story_number, story_suffix, &title);

    let mut story = Story {
        key,
        epic_number,
        story_number,
        story_suffix,
        title,
        user_story,
        acceptance_criteria,
        tasks,
        file_path: file_path.to_string(),
        status,
        total_tasks: 0,
        completed_tasks: 0,
        total_subtasks: 0,
        completed_subtasks: 0,
    };
    story.recount();
    Some(story)
}

/// Drop a leading `---` ... `---` block. A dangling opener leaves the content untouched.
fn strip_frontmatter(content: &str) -> &str {
    if !content.starts_with("---") {
        return content;
    }
    let Some(close) = content[3..].find("\n---") else {
        return content;
    };
    let after_delimiter = 3 + close + "\n---".len();
    match content[after_delimiter..].find('\n') {
        Some(nl) => &content[after_delimiter + nl + 1..],
        None => "",
    }
}

/// Lines of the `##` section whose heading matches `heading`, up to the next `##` heading.
fn section_lines<'a>(body: &'a str, heading: &Regex) -> Option<Vec<&'a str>> {
    let mut lines = body.lines();
    lines.by_ref().find(|line| heading.is_match(line.trim_end()))?;
    Some(lines.take_while(|line| !SECTION_END.is_match(line)).collect())
}

fn parse_acceptance_criteria(lines: &[&str]) -> Vec<AcceptanceCriterion> {
    let mut criteria = Vec::new();
    let mut current: Option<(AcceptanceCriterion, Vec<&str>)> = None;

    for line in lines {
        if let Some(caps) = AC_ENTRY.captures(line.trim_start()) {
            if let Some((ac, body)) = current.take() {
                criteria.push(finish_criterion(ac, &body));
            }
            let Ok(number) = caps[1].parse() else {
                continue;
            };
            let rest = caps
                .get(3)
                .map_or("", |m| m.as_str())
                .trim_start_matches(':')
                .trim();
            let mut body = Vec::new();
            if !rest.is_empty() {
                body.push(rest);
            }
            current = Some((
                AcceptanceCriterion {
                    number,
                    title: caps[2].trim().to_string(),
                    content: String::new(),
                },
                body,
            ));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((ac, body)) = current {
        criteria.push(finish_criterion(ac, &body));
    }
    criteria
}

fn finish_criterion(mut ac: AcceptanceCriterion, body: &[&str]) -> AcceptanceCriterion {
    ac.content = body.join("\n").trim().to_string();
    ac
}

fn parse_tasks(lines: &[&str]) -> Vec<StoryTask> {
    let mut tasks: Vec<StoryTask> = Vec::new();

    for line in lines {
        if let Some(caps) = SUBTASK_LINE.captures(line) {
            let Some(task) = tasks.last_mut() else {
                continue;
            };
            task.subtasks.push(StorySubtask {
                id: format!("{}.{}", &caps[2], &caps[3]),
                description: caps[4].to_string(),
                completed: is_checked(&caps[1]),
            });
        } else if let Some(caps) = TASK_LINE.captures(line) {
            let Ok(number) = caps[2].parse() else {
                continue;
            };
            let (description, acceptance_criteria) = split_ac_refs(&caps[3]);
            tasks.push(StoryTask {
                number,
                description,
                completed: is_checked(&caps[1]),
                acceptance_criteria,
                subtasks: Vec::new(),
            });
        }
    }
    tasks
}

fn is_checked(mark: &str) -> bool {
    mark.eq_ignore_ascii_case("x")
}

/// Split a trailing `(AC: 1, #2 3)` off a task description.
fn split_ac_refs(text: &str) -> (String, Option<Vec<u32>>) {
    match AC_REFS.captures(text) {
        Some(caps) => {
            let refs = NUMBER
                .find_iter(&caps[1])
                .filter_map(|m| m.as_str().parse().ok())
                .collect();
            let start = caps.get(0).map(|m| m.start()).unwrap_or(text.len());
            (text[..start].trim().to_string(), Some(refs))
        }
        None => (text.trim().to_string(), None),
    }
}

fn derive_key(
    file_path: &str,
    epic: u32,
    story: u32,
    suffix: Option<char>,
    title: &str,
) -> String {
    let file_name = file_path.rsplit(['/', '\\']).next().unwrap_or(file_path);
    let stem = file_name.strip_suffix(".md").unwrap_or(file_name);

    if parse_story_key(stem).is_some_and(|parts| parts.slug.is_some()) {
        return stem.to_string();
    }

    let suffix = suffix.map(String::from).unwrap_or_default();
    format!("{}-{}{}-{}", epic, story, suffix, slugify(title))
}

/// Lowercase and collapse every run of non-alphanumerics into one hyphen.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_ALNUM
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_frontmatter_requires_closer() {
        assert_eq!(strip_frontmatter("---\na: 1\n---\n# Body"), "# Body");
        assert_eq!(strip_frontmatter("---\n# Story 1.1: T"), "---\n# Story 1.1: T");
        assert_eq!(strip_frontmatter("# No frontmatter"), "# No frontmatter");
    }

    #[test]
    fn test_split_ac_refs_tolerates_separators() {
        let (desc, refs) = split_ac_refs("Wire the login form (AC: #1, 3 4)");
        assert_eq!(desc, "Wire the login form");
        assert_eq!(refs, Some(vec![1, 3, 4]));

        let (desc, refs) = split_ac_refs("No refs here");
        assert_eq!(desc, "No refs here");
        assert_eq!(refs, None);
    }

    #[test]
    fn test_acceptance_criteria_collect_continuation_lines() {
        let lines = vec![
            "intro text before any criterion",
            "1. **Sign in**: with email",
            "   and password",
            "",
            "2. **Sign out**",
            "   clears the session",
        ];
        let criteria = parse_acceptance_criteria(&lines);
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].number, 1);
        assert_eq!(criteria[0].title, "Sign in");
        assert_eq!(criteria[0].content, "with email\n   and password");
        assert_eq!(criteria[1].title, "Sign out");
        assert_eq!(criteria[1].content, "clears the session");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("User Login & Signup!"), "user-login-signup");
        assert_eq!(slugify("  --Hello--  "), "hello");
    }

    #[test]
    fn test_derive_key_prefers_file_name() {
        assert_eq!(
            derive_key("/a/b/3-5-login-flow.md", 3, 5, None, "Ignored"),
            "3-5-login-flow"
        );
        assert_eq!(
            derive_key("C:\\stories\\3-5a-login.md", 3, 5, Some('a'), "Ignored"),
            "3-5a-login"
        );
        assert_eq!(
            derive_key("/a/b/story.md", 3, 5, Some('b'), "Login Flow"),
            "3-5b-login-flow"
        );
    }

    #[test]
    fn test_section_stops_at_next_heading() {
        let body = "## Tasks\n- [ ] Task 1: a\n### Notes\n- [ ] Task 2: b\n## Dev Notes\n- [ ] Task 3: c";
        let lines = section_lines(body, &TASKS_HEADING).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(parse_tasks(&lines).len(), 2);
    }
}
