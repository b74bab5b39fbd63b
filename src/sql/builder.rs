//! Builds parameterized statements over the pokemon tables. Identifiers are constants; values are always bound.

use crate::model::{IntFilter, Page, PokemonFilter, PokemonInput};
use crate::sql::PgBindValue;

pub const POKEMON_TABLE: &str = "pokemon";
pub const ABILITIES_TABLE: &str = "abilities";
pub const STATS_TABLE: &str = "stats";
pub const TYPES_TABLE: &str = "types";

/// Child tables, in the order they are written and deleted.
pub const CHILD_TABLES: [&str; 3] = [ABILITIES_TABLE, STATS_TABLE, TYPES_TABLE];

const MAIN_ALIAS: &str = "main";

/// One child collection embedded into the parent row as a JSON array.
struct ChildInclude {
    name: &'static str,
    table: &'static str,
    fields: &'static [&'static str],
}

const CHILD_INCLUDES: [ChildInclude; 3] = [
    ChildInclude {
        name: "abilities",
        table: ABILITIES_TABLE,
        fields: &["name", "is_hidden"],
    },
    ChildInclude {
        name: "stats",
        table: STATS_TABLE,
        fields: &["name", "base_stat"],
    },
    ChildInclude {
        name: "types",
        table: TYPES_TABLE,
        fields: &["name"],
    },
];

const PARENT_COLUMNS: [&str; 7] = ["id", "name", "height", "weight", "xp", "image_url", "pokemon_url"];

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf::default()
    }

    /// Append a bind value and return its placeholder (`$n`).
    fn push_param(&mut self, v: impl Into<PgBindValue>) -> String {
        self.params.push(v.into());
        format!("${}", self.params.len())
    }
}

/// Incrementally built AND of predicates. Empty means unconstrained.
#[derive(Debug, Default)]
pub struct Conjunction {
    parts: Vec<String>,
}

impl Conjunction {
    pub fn new() -> Self {
        Conjunction::default()
    }

    pub fn and(&mut self, predicate: impl Into<String>) -> &mut Self {
        self.parts.push(predicate.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// `" WHERE p1 AND p2 ..."`, or an empty string when nothing was added.
    pub fn where_clause(&self) -> String {
        if self.parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.parts.join(" AND "))
        }
    }
}

/// Appends one predicate per present filter field to `conj`, binding values into `q`.
pub struct FilterBuilder<'a> {
    q: &'a mut QueryBuf,
    conj: Conjunction,
}

impl<'a> FilterBuilder<'a> {
    pub fn new(q: &'a mut QueryBuf) -> Self {
        FilterBuilder {
            q,
            conj: Conjunction::new(),
        }
    }

    pub fn name(&mut self, name: Option<&str>) -> &mut Self {
        if let Some(name) = name {
            let ph = self.q.push_param(name);
            self.conj.and(format!("{}.name = {}", MAIN_ALIAS, ph));
        }
        self
    }

    /// Exact/min/max on a parent column.
    pub fn int_column(&mut self, column: &'static str, f: IntFilter) -> &mut Self {
        let column = format!("{}.{}", MAIN_ALIAS, column);
        for p in int_predicates(self.q, &column, f) {
            self.conj.and(p);
        }
        self
    }

    /// Some stat row of the Pokemon has a base_stat satisfying all of `f`.
    pub fn base_stat(&mut self, f: IntFilter) -> &mut Self {
        if f.is_empty() {
            return self;
        }
        let preds = int_predicates(self.q, "s.base_stat", f);
        self.conj.and(exists(STATS_TABLE, "s", &preds.join(" AND ")));
        self
    }

    /// Some row of the child table has a name in `names`. Empty set imposes nothing.
    pub fn child_name_in(&mut self, table: &'static str, names: &[String]) -> &mut Self {
        if names.is_empty() {
            return self;
        }
        let ph = self.q.push_param(names.to_vec());
        self.conj.and(exists(table, "c", &format!("c.name = ANY({})", ph)));
        self
    }

    /// Some ability row of the Pokemon has this hidden flag.
    pub fn is_hidden(&mut self, is_hidden: Option<bool>) -> &mut Self {
        if let Some(flag) = is_hidden {
            let ph = self.q.push_param(flag);
            self.conj.and(exists(ABILITIES_TABLE, "a", &format!("a.is_hidden = {}", ph)));
        }
        self
    }

    pub fn apply(&mut self, filter: &PokemonFilter) -> &mut Self {
        self.name(filter.name.as_deref())
            .int_column("height", filter.height)
            .int_column("weight", filter.weight)
            .int_column("xp", filter.xp)
            .base_stat(filter.base_stat)
            .child_name_in(ABILITIES_TABLE, &filter.abilities)
            .child_name_in(STATS_TABLE, &filter.stats)
            .child_name_in(TYPES_TABLE, &filter.types)
            .is_hidden(filter.is_hidden)
    }

    pub fn finish(self) -> Conjunction {
        self.conj
    }
}

fn int_predicates(q: &mut QueryBuf, column: &str, f: IntFilter) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(v) = f.exact {
        out.push(format!("{} = {}", column, q.push_param(v)));
    }
    if let Some(v) = f.min {
        out.push(format!("{} >= {}", column, q.push_param(v)));
    }
    if let Some(v) = f.max {
        out.push(format!("{} <= {}", column, q.push_param(v)));
    }
    out
}

fn exists(table: &str, alias: &str, condition: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM {table} {alias} WHERE {alias}.pokemon_id = {MAIN_ALIAS}.id AND {condition})"
    )
}

/// Parent columns plus one `json_agg` scalar subquery per child collection, ordered by child id.
fn select_column_list() -> String {
    let mut parts: Vec<String> = PARENT_COLUMNS
        .iter()
        .map(|c| format!("{}.{}", MAIN_ALIAS, c))
        .collect();
    for inc in &CHILD_INCLUDES {
        let fields = inc
            .fields
            .iter()
            .map(|f| format!("'{f}', sub.{f}"))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!(
            "(SELECT COALESCE(json_agg(json_build_object({fields}) ORDER BY sub.id), '[]'::json) \
             FROM {table} sub WHERE sub.pokemon_id = {MAIN_ALIAS}.id) AS {name}",
            table = inc.table,
            name = inc.name,
        ));
    }
    parts.join(", ")
}

/// SELECT one Pokemon with children by id.
pub fn select_by_id(id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id);
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.id = {}",
        select_column_list(),
        POKEMON_TABLE,
        MAIN_ALIAS,
        MAIN_ALIAS,
        ph
    );
    q
}

/// SELECT one Pokemon with children by exact, case-sensitive name.
pub fn select_by_name(name: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(name);
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.name = {}",
        select_column_list(),
        POKEMON_TABLE,
        MAIN_ALIAS,
        MAIN_ALIAS,
        ph
    );
    q
}

/// Filtered, paginated list in id (insertion) order.
pub fn select_list(filter: &PokemonFilter, page: Page) -> QueryBuf {
    let mut q = QueryBuf::new();
    let conj = {
        let mut fb = FilterBuilder::new(&mut q);
        fb.apply(filter);
        fb.finish()
    };
    let limit_ph = q.push_param(i64::from(page.limit));
    let offset_ph = q.push_param(page.offset() as i64);
    q.sql = format!(
        "SELECT {} FROM {} {}{} ORDER BY {}.id LIMIT {} OFFSET {}",
        select_column_list(),
        POKEMON_TABLE,
        MAIN_ALIAS,
        conj.where_clause(),
        MAIN_ALIAS,
        limit_ph,
        offset_ph
    );
    q
}

/// Pokemon having at least one hidden ability, projected onto the hidden ones.
pub fn select_hidden_abilities(skip: u32, limit: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let limit_ph = q.push_param(i64::from(limit));
    let offset_ph = q.push_param(i64::from(skip));
    q.sql = format!(
        "SELECT p.id, p.name, \
         json_agg(json_build_object('name', a.name, 'is_hidden', a.is_hidden) ORDER BY a.id) AS hidden_abilities \
         FROM {} p JOIN {} a ON a.pokemon_id = p.id \
         WHERE a.is_hidden = TRUE \
         GROUP BY p.id, p.name ORDER BY p.id LIMIT {} OFFSET {}",
        POKEMON_TABLE, ABILITIES_TABLE, limit_ph, offset_ph
    );
    q
}

/// Id of the Pokemon with this exact name, if any.
pub fn select_id_by_name(name: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(name);
    q.sql = format!("SELECT id FROM {} WHERE name = {}", POKEMON_TABLE, ph);
    q
}

pub fn select_id(id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id);
    q.sql = format!("SELECT id FROM {} WHERE id = {}", POKEMON_TABLE, ph);
    q
}

fn scalar_params(q: &mut QueryBuf, input: &PokemonInput) -> Vec<String> {
    vec![
        q.push_param(input.name.as_str()),
        q.push_param(input.height),
        q.push_param(input.weight),
        q.push_param(input.xp),
        q.push_param(input.image_url.as_str()),
        q.push_param(input.pokemon_url.as_str()),
    ]
}

/// INSERT parent row; returns generated id.
pub fn insert_pokemon(input: &PokemonInput) -> QueryBuf {
    let mut q = QueryBuf::new();
    let phs = scalar_params(&mut q, input);
    q.sql = format!(
        "INSERT INTO {} (name, height, weight, xp, image_url, pokemon_url) VALUES ({}) RETURNING id",
        POKEMON_TABLE,
        phs.join(", ")
    );
    q
}

/// UPDATE all scalar fields of the parent row.
pub fn update_pokemon(id: i32, input: &PokemonInput) -> QueryBuf {
    let mut q = QueryBuf::new();
    let phs = scalar_params(&mut q, input);
    let id_ph = q.push_param(id);
    q.sql = format!(
        "UPDATE {} SET name = {}, height = {}, weight = {}, xp = {}, image_url = {}, pokemon_url = {} WHERE id = {}",
        POKEMON_TABLE, phs[0], phs[1], phs[2], phs[3], phs[4], phs[5], id_ph
    );
    q
}

/// INSERT every child row of `input` for `pokemon_id`: one multi-row statement per non-empty collection.
pub fn insert_children(pokemon_id: i32, input: &PokemonInput) -> Vec<QueryBuf> {
    let mut out = Vec::new();

    if !input.abilities.is_empty() {
        let mut q = QueryBuf::new();
        let id_ph = q.push_param(pokemon_id);
        let rows: Vec<String> = input
            .abilities
            .iter()
            .map(|a| {
                let name = q.push_param(a.name.as_str());
                let hidden = q.push_param(a.is_hidden);
                format!("({}, {}, {})", id_ph, name, hidden)
            })
            .collect();
        q.sql = format!(
            "INSERT INTO {} (pokemon_id, name, is_hidden) VALUES {}",
            ABILITIES_TABLE,
            rows.join(", ")
        );
        out.push(q);
    }

    if !input.stats.is_empty() {
        let mut q = QueryBuf::new();
        let id_ph = q.push_param(pokemon_id);
        let rows: Vec<String> = input
            .stats
            .iter()
            .map(|s| {
                let name = q.push_param(s.name.as_str());
                let base = q.push_param(s.base_stat);
                format!("({}, {}, {})", id_ph, name, base)
            })
            .collect();
        q.sql = format!(
            "INSERT INTO {} (pokemon_id, name, base_stat) VALUES {}",
            STATS_TABLE,
            rows.join(", ")
        );
        out.push(q);
    }

    if !input.types.is_empty() {
        let mut q = QueryBuf::new();
        let id_ph = q.push_param(pokemon_id);
        let rows: Vec<String> = input
            .types
            .iter()
            .map(|t| format!("({}, {})", id_ph, q.push_param(t.name.as_str())))
            .collect();
        q.sql = format!(
            "INSERT INTO {} (pokemon_id, name) VALUES {}",
            TYPES_TABLE,
            rows.join(", ")
        );
        out.push(q);
    }

    out
}

/// DELETE every row of one child table owned by `pokemon_id`.
pub fn delete_children(table: &'static str, pokemon_id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(pokemon_id);
    q.sql = format!("DELETE FROM {} WHERE pokemon_id = {}", table, ph);
    q
}

/// DELETE parent row (children go by cascade). Returns the id when a row was removed.
pub fn delete_pokemon(id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(id);
    q.sql = format!("DELETE FROM {} WHERE id = {} RETURNING id", POKEMON_TABLE, ph);
    q
}
