use std::cmp::Ordering;
use std::collections::BTreeSet;

use clap::ValueEnum;
use tracing::{debug, trace};

use crate::country::Country;

/// Allowed page sizes, smallest first. The reducer rejects everything else.
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 25, 50];

/// The closed set of sortable columns. Each key maps to one explicit
/// field comparator, there is no runtime field lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Id,
    Code,
    Name,
    NameUn,
    Continent,
    HasStates,
}

impl SortKey {
    pub fn compare(self, a: &Country, b: &Country) -> Ordering {
        match self {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Code => a.code.cmp(&b.code),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::NameUn => a.name_un.cmp(&b.name_un),
            SortKey::Continent => a.continent.cmp(&b.continent),
            // bool orders false < true
            SortKey::HasStates => a.has_states.cmp(&b.has_states),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Code => "code",
            SortKey::Name => "name",
            SortKey::NameUn => "nameUn",
            SortKey::Continent => "continent",
            SortKey::HasStates => "hasStates",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortDirection {
    #[value(name = "asc")]
    Ascending,
    #[value(name = "desc")]
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Tri-state filter on the `hasStates` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasStatesFilter {
    All,
    Only(bool),
}

impl HasStatesFilter {
    /// Parses the string form of the filter: empty selects everything,
    /// "true"/"false" (any case) select one value. Anything else is
    /// rejected so the caller can treat it as a no-op.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "" => Some(HasStatesFilter::All),
            "true" => Some(HasStatesFilter::Only(true)),
            "false" => Some(HasStatesFilter::Only(false)),
            _ => None,
        }
    }

    pub fn matches(self, has_states: bool) -> bool {
        match self {
            HasStatesFilter::All => true,
            HasStatesFilter::Only(wanted) => has_states == wanted,
        }
    }

    /// all -> only true -> only false -> all
    pub fn cycled(self) -> Self {
        match self {
            HasStatesFilter::All => HasStatesFilter::Only(true),
            HasStatesFilter::Only(true) => HasStatesFilter::Only(false),
            HasStatesFilter::Only(false) => HasStatesFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HasStatesFilter::All => "all",
            HasStatesFilter::Only(true) => "yes",
            HasStatesFilter::Only(false) => "no",
        }
    }
}

/// The complete filter/sort/page configuration. Evolves only through
/// [`ViewState::apply`], the derivation functions just read it.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub continent_filter: String,
    pub has_states_filter: HasStatesFilter,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            continent_filter: String::new(),
            has_states_filter: HasStatesFilter::All,
            sort_key: SortKey::NameUn,
            sort_direction: SortDirection::Ascending,
            page_index: 0,
            page_size: PAGE_SIZE_OPTIONS[0],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    SetContinentFilter(String),
    SetHasStatesFilter(HasStatesFilter),
    SetSortKey(SortKey),
    SetPageIndex(usize),
    SetPageSize(usize),
}

impl ViewState {
    pub fn with_overrides(
        continent_filter: Option<String>,
        has_states_filter: Option<HasStatesFilter>,
        sort: Option<(SortKey, SortDirection)>,
    ) -> Self {
        let mut state = Self::default();
        if let Some(filter) = continent_filter {
            state.continent_filter = filter;
        }
        if let Some(filter) = has_states_filter {
            state.has_states_filter = filter;
        }
        if let Some((key, direction)) = sort {
            state.sort_key = key;
            state.sort_direction = direction;
        }
        state
    }

    /// The single place where view state changes.
    ///
    /// Filter and page size changes reset the page to 0, sort changes do
    /// not. An unsupported page size leaves the state untouched; page
    /// indices are taken as-is because pagination degrades to an empty
    /// page instead of failing.
    pub fn apply(&mut self, event: ViewEvent) {
        trace!("Applying {:?}", event);
        match event {
            ViewEvent::SetContinentFilter(filter) => {
                self.continent_filter = filter;
                self.page_index = 0;
            }
            ViewEvent::SetHasStatesFilter(filter) => {
                self.has_states_filter = filter;
                self.page_index = 0;
            }
            ViewEvent::SetSortKey(key) => {
                if key == self.sort_key {
                    self.sort_direction = self.sort_direction.toggled();
                } else {
                    self.sort_key = key;
                    self.sort_direction = SortDirection::Ascending;
                }
            }
            ViewEvent::SetPageIndex(index) => {
                self.page_index = index;
            }
            ViewEvent::SetPageSize(size) => {
                if PAGE_SIZE_OPTIONS.contains(&size) {
                    self.page_size = size;
                    self.page_index = 0;
                } else {
                    debug!("Rejecting unsupported page size {size}");
                }
            }
        }
    }
}

/// Keeps the records whose continent contains `continent_filter`
/// (case-insensitive, empty matches everything) AND whose `has_states`
/// passes the tri-state filter. Relative order is preserved.
pub fn filter<'a>(
    records: &'a [Country],
    continent_filter: &str,
    has_states_filter: HasStatesFilter,
) -> Vec<&'a Country> {
    let needle = continent_filter.to_lowercase();
    records
        .iter()
        .filter(|c| c.continent.to_lowercase().contains(&needle))
        .filter(|c| has_states_filter.matches(c.has_states))
        .collect()
}

/// Orders the filtered records by `key`. `slice::sort_by` is stable and
/// `Descending` only reverses the comparator result (Equal stays Equal),
/// so records with equal keys keep their filter-stage order in both
/// directions.
pub fn sort<'a>(
    filtered: &[&'a Country],
    key: SortKey,
    direction: SortDirection,
) -> Vec<&'a Country> {
    let mut sorted = filtered.to_vec();
    sorted.sort_by(|a, b| {
        let ord = key.compare(a, b);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    sorted
}

/// Cuts the page `page_index` out of the sorted records and returns it
/// together with the post-filter total. A page past the end is empty,
/// never an error.
pub fn paginate<'a, 'b>(
    sorted: &'b [&'a Country],
    page_index: usize,
    page_size: usize,
) -> (&'b [&'a Country], usize) {
    let total = sorted.len();
    let begin = std::cmp::min(page_index.saturating_mul(page_size), total);
    let end = std::cmp::min(begin.saturating_add(page_size), total);
    (&sorted[begin..end], total)
}

/// The derived output of one Filter -> Sort -> Page pass.
#[derive(Debug, Clone)]
pub struct ViewOutput<'a> {
    pub visible: Vec<&'a Country>,
    pub total_count: usize,
}

/// Runs the full derivation pipeline for the given state. Called after
/// every state transition; the stages are cheap enough to recompute
/// from scratch each time.
pub fn recompute<'a>(records: &'a [Country], state: &ViewState) -> ViewOutput<'a> {
    let filtered = filter(records, &state.continent_filter, state.has_states_filter);
    let sorted = sort(&filtered, state.sort_key, state.sort_direction);
    let (visible, total_count) = paginate(&sorted, state.page_index, state.page_size);
    ViewOutput {
        visible: visible.to_vec(),
        total_count,
    }
}

/// Distinct continent values present in the dataset, deduplicated and
/// ordered. Only needs recomputing when the records change.
pub fn distinct_continents(records: &[Country]) -> Vec<String> {
    let set: BTreeSet<&str> = records.iter().map(|c| c.continent.as_str()).collect();
    set.into_iter().map(String::from).collect()
}

/// Number of pages needed for `total` records, 0 for an empty result.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size)
}
