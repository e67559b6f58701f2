use delta_merge::{ChangeSide, ChangeStatus, ConflictSide, Merger};
use git2::{Oid, Repository, Signature};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// A repository with a fork point and two diverging commits of one file
struct Fixture {
    dir: TempDir,
    repo: Repository,
}

/// Fork point, yours and theirs commits
struct Forked {
    base: Oid,
    yours: Oid,
    theirs: Oid,
}

impl Fixture {
    /// Create a new empty repo with deterministic config
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repo");

        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        Self { dir, repo }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write and stage a file
    fn stage(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    /// Commit the index on top of `parents` without moving any ref
    fn commit(&self, message: &str, parents: &[Oid]) -> Oid {
        let sig = Signature::new("Test User", "test@example.com", &git2::Time::new(1234567890, 0)).unwrap();
        let tree_id = self.repo.index().unwrap().write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let parents: Vec<_> = parents.iter().map(|id| self.repo.find_commit(*id).unwrap()).collect();
        let parents: Vec<_> = parents.iter().collect();
        self.repo.commit(None, &sig, &sig, message, &tree, &parents).unwrap()
    }

    /// Commit `base`, then `yours` and `theirs` as two children of it
    fn fork(&self, name: &str, base: &str, yours: &str, theirs: &str) -> Forked {
        self.stage(name, base);
        let base = self.commit("base", &[]);
        self.stage(name, yours);
        let yours = self.commit("yours", &[base]);
        self.stage(name, theirs);
        let theirs = self.commit("theirs", &[base]);
        Forked { base, yours, theirs }
    }

    fn file_at(&self, commit: Oid, name: &str) -> String {
        let tree = self.repo.find_commit(commit).unwrap().tree().unwrap();
        let blob = tree
            .get_path(Path::new(name))
            .unwrap()
            .to_object(&self.repo)
            .unwrap()
            .peel_to_blob()
            .unwrap();
        String::from_utf8(blob.content().to_vec()).unwrap()
    }

    /// Fork point, yours and theirs as the merge sees them
    fn texts(&self, forked: &Forked, name: &str) -> (String, String, String) {
        let base = self.repo.merge_base(forked.yours, forked.theirs).unwrap();
        assert_eq!(base, forked.base);
        (
            self.file_at(base, name),
            self.file_at(forked.yours, name),
            self.file_at(forked.theirs, name),
        )
    }

    /// What git's own merge makes of the file, `None` on conflicts
    fn git_merge(&self, forked: &Forked, name: &str) -> Option<String> {
        let yours = self.repo.find_commit(forked.yours).unwrap();
        let theirs = self.repo.find_commit(forked.theirs).unwrap();
        let mut index = self.repo.merge_commits(&yours, &theirs, None).unwrap();
        if index.has_conflicts() {
            return None;
        }
        let tree = self.repo.find_tree(index.write_tree_to(&self.repo).unwrap()).unwrap();
        let blob = tree
            .get_path(Path::new(name))
            .unwrap()
            .to_object(&self.repo)
            .unwrap()
            .peel_to_blob()
            .unwrap();
        Some(String::from_utf8(blob.content().to_vec()).unwrap())
    }

    /// `git diff -U0` between two commits for one file
    fn git_diff(&self, from: Oid, to: Oid, file: &str) -> String {
        let output = Command::new("git")
            .args([
                "-C",
                self.path().to_str().unwrap(),
                "diff",
                "--no-ext-diff", // Force standard diff, ignore external tools
                "-U0",
                "--no-color",
                &from.to_string(),
                &to.to_string(),
                "--",
                file,
            ])
            .output()
            .expect("Failed to run git diff");
        String::from_utf8(output.stdout).unwrap()
    }
}

fn numbered(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("line {}", i)).collect()
}

fn text(lines: &[String]) -> String {
    lines.join("\n") + "\n"
}

// =============================================================================
// Changes git merges cleanly
// =============================================================================

#[test]
fn disjoint_changes_match_git() {
    let fixture = Fixture::new();
    let base = numbered(12);
    let mut yours = base.clone();
    yours[1] = "yours 2".to_string();
    let mut theirs = base.clone();
    theirs[9] = "theirs 10".to_string();
    theirs.insert(11, "theirs extra".to_string());

    let forked = fixture.fork("notes.txt", &text(&base), &text(&yours), &text(&theirs));
    let (base, yours, theirs) = fixture.texts(&forked, "notes.txt");
    let outcome = Merger::default()
        .merge("notes.txt", &base, &yours, &theirs, |_| true)
        .unwrap();

    assert!(outcome.resolved);
    assert_eq!(Some(outcome.text), fixture.git_merge(&forked, "notes.txt"));
}

#[test]
fn change_on_one_side_only() {
    let fixture = Fixture::new();
    let base = numbered(5);
    let mut yours = base.clone();
    yours.remove(2);

    let forked = fixture.fork("notes.txt", &text(&base), &text(&yours), &text(&base));
    let (base, yours, theirs) = fixture.texts(&forked, "notes.txt");
    let outcome = Merger::default()
        .merge("notes.txt", &base, &yours, &theirs, |_| true)
        .unwrap();

    assert!(outcome.resolved);
    assert_eq!(outcome.text, yours);
    assert_eq!(Some(outcome.text), fixture.git_merge(&forked, "notes.txt"));
}

// =============================================================================
// Conflicts git leaves to the user
// =============================================================================

#[test]
fn same_line_changed_differently_stays_conflicting() {
    let fixture = Fixture::new();
    let base = numbered(6);
    let mut yours = base.clone();
    yours[3] = "yours 4".to_string();
    let mut theirs = base.clone();
    theirs[3] = "theirs 4".to_string();

    let forked = fixture.fork("notes.txt", &text(&base), &text(&yours), &text(&theirs));
    assert_eq!(fixture.git_merge(&forked, "notes.txt"), None);

    let (base_text, yours, theirs) = fixture.texts(&forked, "notes.txt");
    let outcome = Merger::default()
        .merge("notes.txt", &base_text, &yours, &theirs, |_| true)
        .unwrap();

    assert!(!outcome.resolved);
    assert_eq!(outcome.text, base_text);
    assert_eq!(outcome.data.conflicting_count(), 2);
    assert!(outcome.conflicts.contains("yours 4"));
    assert!(outcome.conflicts.contains("theirs 4"));
}

#[test]
fn words_changed_in_one_line_are_combined() {
    let fixture = Fixture::new();
    let base = "let total = price * count;\n";
    let yours = "let total = cost * count;\n";
    let theirs = "let total = price * amount;\n";

    let forked = fixture.fork("calc.rs", base, yours, theirs);
    assert_eq!(fixture.git_merge(&forked, "calc.rs"), None);

    let (base, yours, theirs) = fixture.texts(&forked, "calc.rs");
    let outcome = Merger::default()
        .merge("calc.rs", &base, &yours, &theirs, |_| true)
        .unwrap();

    assert!(outcome.resolved);
    assert_eq!(outcome.text, "let total = cost * amount;\n");
}

#[test]
fn language_entries_are_united() {
    let fixture = Fixture::new();
    let base = "<values>\n</values>\n";
    let yours = "<values>\n  <stringEntry><name>greeting</name><value>Hello</value></stringEntry>\n</values>\n";
    let theirs = "<values>\n  <stringEntry><name>farewell</name><value>Bye</value></stringEntry>\n</values>\n";

    let forked = fixture.fork("lang.xml", base, yours, theirs);
    assert_eq!(fixture.git_merge(&forked, "lang.xml"), None);

    let (base, yours, theirs) = fixture.texts(&forked, "lang.xml");
    let outcome = Merger::default()
        .merge("lang.xml", &base, &yours, &theirs, |_| true)
        .unwrap();

    assert!(outcome.resolved);
    assert_eq!(
        outcome.text,
        "<values>\n  <stringEntry><name>greeting</name><value>Hello</value></stringEntry>\n  <stringEntry><name>farewell</name><value>Bye</value></stringEntry>\n</values>\n"
    );
    for side in [ConflictSide::Yours, ConflictSide::Theirs] {
        assert!(
            outcome
                .data
                .diff(side)
                .deltas()
                .iter()
                .all(|delta| delta.status() == ChangeStatus::Accepted)
        );
    }
}

#[test]
fn changelog_includes_are_united() {
    let fixture = Fixture::new();
    let base = "<databaseChangeLog>\n  <include file=\"0001.xml\"/>\n</databaseChangeLog>\n";
    let yours = "<databaseChangeLog>\n  <include file=\"0001.xml\"/>\n  <include file=\"0002-users.xml\"/>\n</databaseChangeLog>\n";
    let theirs = "<databaseChangeLog>\n  <include file=\"0001.xml\"/>\n  <include file=\"0002-orders.xml\"/>\n</databaseChangeLog>\n";

    let forked = fixture.fork("changelog.xml", base, yours, theirs);
    let (base, yours, theirs) = fixture.texts(&forked, "changelog.xml");
    let outcome = Merger::default()
        .merge("changelog.xml", &base, &yours, &theirs, |_| true)
        .unwrap();

    assert!(outcome.resolved);
    assert!(outcome.text.contains("0002-users.xml"));
    assert!(outcome.text.contains("0002-orders.xml"));
}

// =============================================================================
// Patches from git
// =============================================================================

#[test]
fn git_patch_gives_the_same_deltas() {
    let fixture = Fixture::new();
    let base = numbered(20);
    let mut yours = base.clone();
    yours[4] = "changed 5".to_string();
    yours.remove(10);
    yours.insert(15, "inserted".to_string());

    let forked = fixture.fork("notes.txt", &text(&base), &text(&yours), &text(&base));
    let patch = fixture.git_diff(forked.base, forked.yours, "notes.txt");
    let (base, yours, _) = fixture.texts(&forked, "notes.txt");

    let merger = Merger::default();
    let from_patch = merger.diff_with_patch(&base, &yours, &patch).unwrap();
    let built_in = merger.diff("notes.txt", &base, &yours);

    assert_eq!(from_patch.header().file_path(), Some("notes.txt"));
    assert_eq!(from_patch.deltas().len(), 3);
    assert_eq!(from_patch.deltas(), built_in.deltas());
    let inserted = &from_patch.deltas()[2];
    assert_eq!(from_patch.delta_text(inserted, ChangeSide::New), "inserted\n");
}
