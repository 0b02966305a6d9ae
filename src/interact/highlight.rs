//! Click-to-highlight of a table and its neighborhood.

use std::collections::{HashMap, HashSet, VecDeque};

use super::Emphasis;
use crate::model::Edge;

/// Hop limit for the highlight neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Hops(u32),
    All,
}

impl Default for Depth {
    fn default() -> Self {
        Depth::Hops(1)
    }
}

impl Depth {
    /// `"all"`, or a hop count read from the leading digits. Anything that
    /// does not yield a positive count means one hop.
    pub fn parse(value: &str) -> Self {
        let v = value.trim();
        if v.eq_ignore_ascii_case("all") {
            return Depth::All;
        }
        let digits: String = v.chars().take_while(char::is_ascii_digit).collect();
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Depth::Hops(n),
            _ => Depth::Hops(1),
        }
    }

    fn allows(self, hops: u32) -> bool {
        match self {
            Depth::All => true,
            Depth::Hops(n) => hops < n,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingTap {
    id: String,
    x: f64,
    y: f64,
    moved: bool,
}

#[derive(Debug, Clone)]
pub struct Highlight {
    adjacency: HashMap<String, HashSet<String>>,
    selected: Option<String>,
    depth: Depth,
    tap: Option<PendingTap>,
    click_threshold: f64,
}

impl Highlight {
    pub fn new(click_threshold: f64) -> Self {
        Self {
            adjacency: HashMap::new(),
            selected: None,
            depth: Depth::default(),
            tap: None,
            click_threshold,
        }
    }

    /// Rebuild the undirected adjacency for a new graph. Clears the
    /// selection; the depth setting survives.
    pub fn setup<'a>(&mut self, tables: impl IntoIterator<Item = &'a str>, edges: &[Edge]) {
        self.adjacency.clear();
        for id in tables {
            self.adjacency.entry(id.to_string()).or_default();
        }
        for e in edges {
            self.adjacency
                .entry(e.from.clone())
                .or_default()
                .insert(e.to.clone());
            self.adjacency
                .entry(e.to.clone())
                .or_default()
                .insert(e.from.clone());
        }
        self.selected = None;
        self.tap = None;
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    /// Tables within the hop limit of `start`, `start` included.
    pub fn reachable(&self, start: &str) -> HashSet<String> {
        let mut visited = HashSet::from([start.to_string()]);
        let mut queue = VecDeque::from([(start, 0u32)]);
        while let Some((id, hops)) = queue.pop_front() {
            if !self.depth.allows(hops) {
                continue;
            }
            let Some(neighbors) = self.adjacency.get(id) else {
                continue;
            };
            for n in neighbors {
                if visited.insert(n.clone()) {
                    queue.push_back((n.as_str(), hops + 1));
                }
            }
        }
        visited
    }

    /// Primary-button press on table `id` at screen point `(x, y)`.
    pub fn pointer_down(&mut self, id: &str, x: f64, y: f64, button: i16) {
        if button != 0 {
            return;
        }
        self.tap = Some(PendingTap {
            id: id.to_string(),
            x,
            y,
            moved: false,
        });
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some(tap) = &mut self.tap {
            if (x - tap.x).hypot(y - tap.y) > self.click_threshold {
                tap.moved = true;
            }
        }
    }

    /// Completes a tap. A click (no movement beyond the threshold) toggles
    /// the selection and re-applies emphasis; returns true in that case.
    pub fn pointer_up(&mut self, emphasis: &mut Emphasis, edges: &[Edge]) -> bool {
        let Some(tap) = self.tap.take() else {
            return false;
        };
        if tap.moved {
            return false;
        }
        if self.selected.as_deref() == Some(tap.id.as_str()) {
            self.selected = None;
        } else {
            self.selected = Some(tap.id);
        }
        self.apply(emphasis, edges);
        true
    }

    pub fn pointer_cancel(&mut self) {
        self.tap = None;
    }

    /// Select `id` directly, as if it had been clicked. Unknown ids are
    /// ignored.
    pub fn select(&mut self, id: &str, emphasis: &mut Emphasis, edges: &[Edge]) -> bool {
        if !self.adjacency.contains_key(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        self.apply(emphasis, edges);
        true
    }

    /// Click on the empty canvas background.
    pub fn clear(&mut self, emphasis: &mut Emphasis, edges: &[Edge]) {
        self.selected = None;
        self.apply(emphasis, edges);
    }

    /// Change the hop limit; re-applies when something is selected.
    pub fn set_depth(&mut self, value: &str, emphasis: &mut Emphasis, edges: &[Edge]) {
        self.depth = Depth::parse(value);
        if self.selected.is_some() {
            self.apply(emphasis, edges);
        }
    }

    /// Dim everything outside the selection's neighborhood, or nothing when
    /// there is no selection.
    pub fn apply(&self, emphasis: &mut Emphasis, edges: &[Edge]) {
        let Some(start) = &self.selected else {
            emphasis.clear();
            emphasis.selected = None;
            return;
        };
        let keep = self.reachable(start);
        emphasis.dimmed_tables = self
            .adjacency
            .keys()
            .filter(|id| !keep.contains(*id))
            .cloned()
            .collect();
        emphasis.dimmed_links = edges
            .iter()
            .enumerate()
            .filter(|(_, e)| !(keep.contains(&e.from) && keep.contains(&e.to)))
            .map(|(i, _)| i)
            .collect();
        emphasis.selected = Some(start.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (Vec<&'static str>, Vec<Edge>) {
        let tables = vec!["a", "b", "c", "d", "lonely"];
        let edges = vec![
            Edge::many_to_one("b", "a"),
            Edge::many_to_one("c", "b"),
            Edge::many_to_one("d", "c"),
            Edge::many_to_one("d", "d"),
        ];
        (tables, edges)
    }

    fn setup() -> (Highlight, Vec<Edge>) {
        let (tables, edges) = chain();
        let mut h = Highlight::new(5.0);
        h.setup(tables, &edges);
        (h, edges)
    }

    fn sorted(set: &HashSet<String>) -> Vec<&str> {
        let mut v: Vec<&str> = set.iter().map(String::as_str).collect();
        v.sort();
        v
    }

    #[test]
    fn test_depth_parse() {
        assert_eq!(Depth::parse("2"), Depth::Hops(2));
        assert_eq!(Depth::parse("ALL"), Depth::All);
        assert_eq!(Depth::parse("0"), Depth::Hops(1));
        assert_eq!(Depth::parse("deep"), Depth::Hops(1));
        assert_eq!(Depth::parse("3px"), Depth::Hops(3));
    }

    #[test]
    fn test_reachable_by_depth() {
        let (mut h, edges) = setup();
        let mut em = Emphasis::default();
        assert_eq!(sorted(&h.reachable("b")), vec!["a", "b", "c"]);
        h.set_depth("2", &mut em, &edges);
        assert_eq!(sorted(&h.reachable("a")), vec!["a", "b", "c"]);
        h.set_depth("all", &mut em, &edges);
        // self loop on `d` does not stall the walk
        assert_eq!(sorted(&h.reachable("a")), vec!["a", "b", "c", "d"]);
        assert!(em.is_clear());
    }

    #[test]
    fn test_click_toggles_selection() {
        let (mut h, edges) = setup();
        let mut em = Emphasis::default();

        h.pointer_down("b", 100.0, 100.0, 0);
        h.pointer_move(103.0, 103.0);
        assert!(h.pointer_up(&mut em, &edges));
        assert_eq!(h.selected(), Some("b"));
        assert_eq!(sorted(&em.dimmed_tables), vec!["d", "lonely"]);
        assert!(em.dimmed_links.contains(&2) && em.dimmed_links.contains(&3));
        assert!(!em.dimmed_links.contains(&0));
        assert_eq!(em.selected.as_deref(), Some("b"));

        h.pointer_down("b", 0.0, 0.0, 0);
        assert!(h.pointer_up(&mut em, &edges));
        assert_eq!(h.selected(), None);
        assert!(em.is_clear());
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let (mut h, edges) = setup();
        let mut em = Emphasis::default();
        h.pointer_down("a", 0.0, 0.0, 0);
        h.pointer_move(6.0, 0.0);
        assert!(!h.pointer_up(&mut em, &edges));
        h.pointer_down("a", 0.0, 0.0, 2);
        assert!(!h.pointer_up(&mut em, &edges));
        assert_eq!(h.selected(), None);
    }

    #[test]
    fn test_depth_change_reapplies() {
        let (mut h, edges) = setup();
        let mut em = Emphasis::default();
        h.pointer_down("a", 0.0, 0.0, 0);
        h.pointer_up(&mut em, &edges);
        assert_eq!(sorted(&em.dimmed_tables), vec!["c", "d", "lonely"]);
        h.set_depth("all", &mut em, &edges);
        assert_eq!(sorted(&em.dimmed_tables), vec!["lonely"]);
        h.clear(&mut em, &edges);
        assert!(em.is_clear());
    }

    #[test]
    fn test_select_by_id() {
        let (mut h, edges) = setup();
        let mut em = Emphasis::default();
        assert!(!h.select("missing", &mut em, &edges));
        assert!(h.select("lonely", &mut em, &edges));
        assert_eq!(em.dimmed_tables.len(), 4);
        assert_eq!(em.dimmed_links.len(), 4);
    }
}
