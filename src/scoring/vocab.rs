// src/scoring/vocab.rs
//! Fixed technology vocabulary and skill synonyms.
//!
//! Matching is whole-word and case-insensitive. `java` never matches inside
//! "javascript", "java script" or "java-script".

use once_cell::sync::Lazy;
use regex::Regex;

/// Terms looked for in every posting to infer what it asks for.
pub const TECH_VOCABULARY: [&str; 20] = [
    "python",
    "javascript",
    "react",
    "node",
    "aws",
    "docker",
    "sql",
    "java",
    "c++",
    "typescript",
    "go",
    "rust",
    "kubernetes",
    "html",
    "css",
    "django",
    "fastapi",
    "flask",
    "next.js",
    "vue",
];

/// Canonical skill name and the spellings that map onto it.
pub const SKILL_SYNONYMS: &[(&str, &[&str])] = &[
    ("python", &["python", "py"]),
    ("javascript", &["javascript", "js", "es6"]),
    ("typescript", &["typescript", "ts"]),
    ("react", &["react", "reactjs", "react.js"]),
    ("node.js", &["node.js", "nodejs", "node"]),
    ("express", &["express", "expressjs", "express.js"]),
    ("fastapi", &["fastapi"]),
    ("flask", &["flask"]),
    ("django", &["django"]),
    ("sql", &["sql", "mysql", "postgresql", "postgres", "sqlite"]),
    ("nosql", &["nosql", "mongodb", "mongo", "cassandra", "dynamodb"]),
    ("aws", &["aws", "amazon web services", "ec2", "s3", "lambda"]),
    ("docker", &["docker", "containerization"]),
    ("kubernetes", &["kubernetes", "k8s"]),
    ("git", &["git", "github", "gitlab"]),
    ("ci/cd", &["ci/cd", "cicd", "jenkins", "github actions"]),
    ("html", &["html", "html5"]),
    ("css", &["css", "css3", "tailwind", "bootstrap", "sass", "less"]),
    ("java", &["java"]),
    ("c++", &["c++", "cpp"]),
    ("c#", &["c#", "csharp"]),
    ("go", &["go", "golang"]),
    ("rust", &["rust"]),
    ("kafka", &["kafka"]),
    ("redis", &["redis"]),
    ("graphql", &["graphql"]),
    ("rest api", &["rest api", "restful api", "rest"]),
    (
        "machine learning",
        &["machine learning", "ml", "tensorflow", "pytorch", "scikit-learn"],
    ),
    ("data science", &["data science", "pandas", "numpy"]),
    ("linux", &["linux", "bash", "shell"]),
    ("agile", &["agile", "scrum", "kanban"]),
];

static RE_JAVA_SCRIPT_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-?script").unwrap());

struct Term {
    name: &'static str,
    canonical: &'static str,
    re: Regex,
}

fn term_regex(term: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(term))).ok()
}

static VOCAB_TERMS: Lazy<Vec<Term>> = Lazy::new(|| {
    TECH_VOCABULARY
        .iter()
        .filter_map(|&t| {
            term_regex(t).map(|re| Term {
                name: t,
                canonical: t,
                re,
            })
        })
        .collect()
});

static SYNONYM_TERMS: Lazy<Vec<Term>> = Lazy::new(|| {
    SKILL_SYNONYMS
        .iter()
        .flat_map(|&(canonical, variants)| {
            variants.iter().filter_map(move |&v| {
                term_regex(v).map(|re| Term {
                    name: v,
                    canonical,
                    re,
                })
            })
        })
        .collect()
});

fn term_matches(term: &str, re: &Regex, text: &str) -> bool {
    if term != "java" {
        return re.is_match(text);
    }
    re.find_iter(text)
        .any(|m| !RE_JAVA_SCRIPT_TAIL.is_match(&text[m.end()..]))
}

/// Whole-word test for an arbitrary (lowercased) term in lowercased text.
pub fn mentions(text_lower: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    match term_regex(term) {
        Some(re) => term_matches(term, &re, text_lower),
        None => false,
    }
}

/// Vocabulary terms present in `text`, in vocabulary order.
pub fn implied_terms(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    VOCAB_TERMS
        .iter()
        .filter(|t| term_matches(t.name, &t.re, &lower))
        .map(|t| t.name)
        .collect()
}

/// Canonical name for a known spelling; anything else is just lowercased and trimmed.
pub fn normalize_skill(skill: &str) -> String {
    let cleaned = skill.trim().to_lowercase();
    SKILL_SYNONYMS
        .iter()
        .find(|(_, variants)| variants.contains(&cleaned.as_str()))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or(cleaned)
}

/// Normalized, first-seen order, no duplicates, blanks dropped.
pub fn normalize_skill_list<S: AsRef<str>>(skills: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for s in skills {
        let n = normalize_skill(s.as_ref());
        if !n.is_empty() && !out.contains(&n) {
            out.push(n);
        }
    }
    out
}

/// Canonical skills mentioned anywhere in `text`, in synonym-table order.
pub fn extract_skills_from_text(text: &str) -> Vec<&'static str> {
    if text.is_empty() {
        return Vec::new();
    }
    let lower = text.to_lowercase();
    let mut found: Vec<&'static str> = Vec::new();
    for t in SYNONYM_TERMS.iter() {
        if !found.contains(&t.canonical) && term_matches(t.name, &t.re, &lower) {
            found.push(t.canonical);
        }
    }
    found
}
