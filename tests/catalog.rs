// Integration tests for the catalog façade against PostgreSQL.
// Each test runs in its own schema. Skipped when DATABASE_URL is not set.

use pokedex::sql::{CHILD_TABLES, POKEMON_TABLE};
use pokedex::{
    ensure_schema, Ability, AppError, CatalogService, IntFilter, Page, PokemonFilter, PokemonInput, PokemonType,
    Settings, Stat,
};
use sqlx::PgPool;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SCHEMA_SEQ: AtomicU32 = AtomicU32::new(0);

struct TestDb {
    pool: PgPool,
    schema: String,
}

impl TestDb {
    async fn drop_schema(self) {
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
            .execute(&self.pool)
            .await
            .unwrap();
        self.pool.close().await;
    }
}

async fn test_db() -> Option<TestDb> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return None;
    };
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos();
    let schema = format!(
        "pokedex_test_{}_{}_{}",
        std::process::id(),
        SCHEMA_SEQ.fetch_add(1, Ordering::SeqCst),
        nanos
    );
    let settings = Settings::from_lookup(|k| match k {
        "DATABASE_URL" => Some(url.clone()),
        "DB_SCHEMA" => Some(schema.clone()),
        "DB_MAX_CONNECTIONS" => Some("4".into()),
        _ => None,
    })
    .unwrap();
    let pool = pokedex::connect(&settings).await.unwrap();
    ensure_schema(&pool, Some(&schema)).await.unwrap();
    Some(TestDb { pool, schema })
}

/// Row counts of (pokemon, abilities, stats, types).
async fn table_counts(pool: &PgPool) -> [i64; 4] {
    let mut out = [0; 4];
    for (slot, table) in out.iter_mut().zip([POKEMON_TABLE].iter().chain(CHILD_TABLES.iter())) {
        *slot = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap();
    }
    out
}

/// Child rows across all three child tables owned by `pokemon_id`.
async fn child_row_count(pool: &PgPool, pokemon_id: i32) -> i64 {
    let mut total = 0;
    for table in CHILD_TABLES {
        let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE pokemon_id = $1", table))
            .bind(pokemon_id)
            .fetch_one(pool)
            .await
            .unwrap();
        total += n;
    }
    total
}

/// Makes every insert of a `fire` type fail inside the store.
async fn reject_fire_types(pool: &PgPool) {
    sqlx::query("ALTER TABLE types ADD CONSTRAINT no_fire CHECK (name <> 'fire')")
        .execute(pool)
        .await
        .unwrap();
}

fn pokemon(name: &str, types: &[&str], abilities: &[(&str, bool)], stats: &[(&str, i32)]) -> PokemonInput {
    PokemonInput {
        name: name.into(),
        height: 7,
        weight: 69,
        xp: 64,
        image_url: format!("https://img.example/{}.png", name.to_lowercase()),
        pokemon_url: format!("https://pokeapi.co/api/v2/pokemon/{}", name.to_lowercase()),
        abilities: abilities
            .iter()
            .map(|(n, h)| Ability { name: n.to_string(), is_hidden: *h })
            .collect(),
        stats: stats
            .iter()
            .map(|(n, b)| Stat { name: n.to_string(), base_stat: *b })
            .collect(),
        types: types.iter().map(|t| PokemonType { name: t.to_string() }).collect(),
    }
}

fn pikachu() -> PokemonInput {
    PokemonInput {
        name: "Pikachu".into(),
        height: 4,
        weight: 60,
        xp: 112,
        image_url: "https://img.example/pikachu.png".into(),
        pokemon_url: "https://pokeapi.co/api/v2/pokemon/25".into(),
        abilities: vec![Ability { name: "Static".into(), is_hidden: false }],
        stats: vec![Stat { name: "speed".into(), base_stat: 90 }],
        types: vec![PokemonType { name: "electric".into() }],
    }
}

fn assert_matches_input(got: &pokedex::Pokemon, input: &PokemonInput) {
    assert_eq!(got.name, input.name);
    assert_eq!((got.height, got.weight, got.xp), (input.height, input.weight, input.xp));
    assert_eq!(got.image_url, input.image_url);
    assert_eq!(got.pokemon_url, input.pokemon_url);
    assert_eq!(got.abilities, input.abilities);
    assert_eq!(got.stats, input.stats);
    assert_eq!(got.types, input.types);
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let Some(db) = test_db().await else { return };
    let input = pokemon(
        "Bulbasaur",
        &["grass", "poison"],
        &[("overgrow", false), ("chlorophyll", true)],
        &[("hp", 45), ("attack", 49)],
    );
    let id = CatalogService::create(&db.pool, &input).await.unwrap();
    let got = CatalogService::get_by_id(&db.pool, id).await.unwrap();
    assert_eq!(got.id, id);
    assert_matches_input(&got, &input);
    db.drop_schema().await;
}

#[tokio::test]
async fn empty_child_collections_read_back_empty() {
    let Some(db) = test_db().await else { return };
    let input = pokemon("Ditto", &[], &[], &[]);
    let id = CatalogService::create(&db.pool, &input).await.unwrap();
    let got = CatalogService::get_by_id(&db.pool, id).await.unwrap();
    assert!(got.abilities.is_empty() && got.stats.is_empty() && got.types.is_empty());
    db.drop_schema().await;
}

#[tokio::test]
async fn replace_swaps_the_whole_child_set() {
    let Some(db) = test_db().await else { return };
    let id = CatalogService::create(
        &db.pool,
        &pokemon("Eevee", &["normal"], &[("run-away", false), ("adaptability", false)], &[("hp", 55)]),
    )
    .await
    .unwrap();

    let new_input = PokemonInput {
        height: 10,
        ..pokemon("Vaporeon", &["water"], &[("adaptability", false), ("hydration", true)], &[("hp", 130)])
    };
    CatalogService::replace(&db.pool, id, &new_input).await.unwrap();

    let got = CatalogService::get_by_id(&db.pool, id).await.unwrap();
    assert_matches_input(&got, &new_input);
    assert_eq!(child_row_count(&db.pool, id).await, 4);
    db.drop_schema().await;
}

#[tokio::test]
async fn replace_missing_id_is_not_found() {
    let Some(db) = test_db().await else { return };
    let err = CatalogService::replace(&db.pool, 4242, &pikachu()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(table_counts(&db.pool).await, [0, 0, 0, 0]);
    db.drop_schema().await;
}

#[tokio::test]
async fn replace_onto_another_name_is_rejected_and_unchanged() {
    let Some(db) = test_db().await else { return };
    CatalogService::create(&db.pool, &pikachu()).await.unwrap();
    let raichu = pokemon("Raichu", &["electric"], &[("static", false)], &[("speed", 110)]);
    let id = CatalogService::create(&db.pool, &raichu).await.unwrap();

    let err = CatalogService::replace(&db.pool, id, &pikachu()).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateName(name) if name == "Pikachu"));
    assert_matches_input(&CatalogService::get_by_id(&db.pool, id).await.unwrap(), &raichu);
    db.drop_schema().await;
}

#[tokio::test]
async fn delete_removes_parent_and_children() {
    let Some(db) = test_db().await else { return };
    let id = CatalogService::create(&db.pool, &pikachu()).await.unwrap();
    CatalogService::delete(&db.pool, id).await.unwrap();

    let err = CatalogService::get_by_id(&db.pool, id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(child_row_count(&db.pool, id).await, 0);

    let again = CatalogService::delete(&db.pool, id).await.unwrap_err();
    assert!(matches!(again, AppError::NotFound(_)));
    db.drop_schema().await;
}

#[tokio::test]
async fn duplicate_create_leaves_store_unchanged() {
    let Some(db) = test_db().await else { return };
    CatalogService::create(&db.pool, &pikachu()).await.unwrap();
    let before = table_counts(&db.pool).await;

    let mut dup = pikachu();
    dup.types = vec![PokemonType { name: "fairy".into() }];
    let err = CatalogService::create(&db.pool, &dup).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateName(_)));
    assert_eq!(table_counts(&db.pool).await, before);
    db.drop_schema().await;
}

#[tokio::test]
async fn failed_child_insert_rolls_back_create() {
    let Some(db) = test_db().await else { return };
    reject_fire_types(&db.pool).await;
    let charmander = pokemon("Charmander", &["fire"], &[("blaze", false)], &[("hp", 39)]);

    let err = CatalogService::create(&db.pool, &charmander).await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(table_counts(&db.pool).await, [0, 0, 0, 0]);
    let lookup = CatalogService::get_by_name(&db.pool, "Charmander").await.unwrap_err();
    assert!(matches!(lookup, AppError::NotFound(_)));
    db.drop_schema().await;
}

#[tokio::test]
async fn failed_child_insert_rolls_back_replace() {
    let Some(db) = test_db().await else { return };
    let eevee = pokemon("Eevee", &["normal"], &[("run-away", false)], &[("hp", 55)]);
    let id = CatalogService::create(&db.pool, &eevee).await.unwrap();
    reject_fire_types(&db.pool).await;

    let flareon = pokemon("Flareon", &["fire"], &[("flash-fire", false)], &[("hp", 65)]);
    let err = CatalogService::replace(&db.pool, id, &flareon).await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));

    assert_matches_input(&CatalogService::get_by_id(&db.pool, id).await.unwrap(), &eevee);
    assert_eq!(child_row_count(&db.pool, id).await, 3);
    assert_eq!(table_counts(&db.pool).await, [1, 1, 1, 1]);
    db.drop_schema().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_of_one_name_admit_exactly_one() {
    let Some(db) = test_db().await else { return };
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pool = db.pool.clone();
            tokio::spawn(async move {
                let mew = pokemon("Mew", &["psychic"], &[("synchronize", false)], &[("hp", 100)]);
                CatalogService::create(&pool, &mew).await
            })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::DuplicateName(name)) => assert_eq!(name, "Mew"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(table_counts(&db.pool).await, [1, 1, 1, 1]);
    db.drop_schema().await;
}

#[tokio::test]
async fn invalid_input_never_touches_the_store() {
    let Some(db) = test_db().await else { return };
    let mut bad = pikachu();
    bad.types.push(PokemonType { name: "shadow".into() });
    let err = CatalogService::create(&db.pool, &bad).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(table_counts(&db.pool).await, [0, 0, 0, 0]);
    db.drop_schema().await;
}

#[tokio::test]
async fn pages_are_disjoint_and_contiguous() {
    let Some(db) = test_db().await else { return };
    let mut ids = Vec::new();
    for i in 0..25 {
        let id = CatalogService::create(&db.pool, &pokemon(&format!("Mon{:02}", i), &["normal"], &[], &[]))
            .await
            .unwrap();
        ids.push(id);
    }
    let all = PokemonFilter::default();
    let p1 = CatalogService::list(&db.pool, Page::new(1, 20), &all).await.unwrap();
    let p2 = CatalogService::list(&db.pool, Page::new(2, 20), &all).await.unwrap();
    let p3 = CatalogService::list(&db.pool, Page::new(3, 20), &all).await.unwrap();
    assert_eq!(p1.len(), 20);
    assert_eq!(p2.len(), 5);
    assert!(p3.is_empty());

    let joined: Vec<i32> = p1.iter().chain(p2.iter()).map(|p| p.id).collect();
    assert_eq!(joined, ids);

    let everything = CatalogService::list(&db.pool, Page::new(1, 100), &all).await.unwrap();
    assert_eq!(everything.len(), 25);
    db.drop_schema().await;
}

#[tokio::test]
async fn type_filter_is_existential() {
    let Some(db) = test_db().await else { return };
    let charizard = CatalogService::create(&db.pool, &pokemon("Charizard", &["fire", "flying"], &[], &[]))
        .await
        .unwrap();
    CatalogService::create(&db.pool, &pokemon("Squirtle", &["water"], &[], &[]))
        .await
        .unwrap();
    let vulpix = CatalogService::create(&db.pool, &pokemon("Vulpix", &["fire"], &[], &[]))
        .await
        .unwrap();
    CatalogService::create(&db.pool, &pokemon("Pidgey", &["normal", "flying"], &[], &[]))
        .await
        .unwrap();

    let filter = PokemonFilter {
        types: vec!["fire".into()],
        ..Default::default()
    };
    let got: Vec<i32> = CatalogService::list(&db.pool, Page::default(), &filter)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(got, vec![charizard, vulpix]);

    let either = PokemonFilter {
        types: vec!["water".into(), "flying".into()],
        ..Default::default()
    };
    let names: Vec<String> = CatalogService::list(&db.pool, Page::default(), &either)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Charizard", "Squirtle", "Pidgey"]);
    db.drop_schema().await;
}

#[tokio::test]
async fn filters_combine_by_conjunction() {
    let Some(db) = test_db().await else { return };
    let mut small_fire = pokemon("Charmander", &["fire"], &[("blaze", false), ("solar-power", true)], &[("speed", 65)]);
    small_fire.height = 6;
    let mut big_fire = pokemon("Charizard", &["fire"], &[("blaze", false)], &[("speed", 100)]);
    big_fire.height = 17;
    let mut small_water = pokemon("Squirtle", &["water"], &[("torrent", false)], &[("speed", 43)]);
    small_water.height = 5;
    for p in [&small_fire, &big_fire, &small_water] {
        CatalogService::create(&db.pool, p).await.unwrap();
    }

    let fire_and_small = PokemonFilter {
        types: vec!["fire".into()],
        height: IntFilter { exact: None, min: None, max: Some(6) },
        ..Default::default()
    };
    let got = CatalogService::list(&db.pool, Page::default(), &fire_and_small).await.unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].name, "Charmander");

    let inclusive = PokemonFilter {
        base_stat: IntFilter { exact: None, min: Some(65), max: Some(100) },
        ..Default::default()
    };
    let got = CatalogService::list(&db.pool, Page::default(), &inclusive).await.unwrap();
    assert_eq!(got.len(), 2);

    let hidden = PokemonFilter {
        is_hidden: Some(true),
        ..Default::default()
    };
    let got = CatalogService::list(&db.pool, Page::default(), &hidden).await.unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].name, "Charmander");

    let none = PokemonFilter {
        name: Some("Mew".into()),
        ..Default::default()
    };
    assert!(CatalogService::list(&db.pool, Page::default(), &none).await.unwrap().is_empty());
    db.drop_schema().await;
}

#[tokio::test]
async fn pikachu_by_name_and_hidden_abilities() {
    let Some(db) = test_db().await else { return };
    let id = CatalogService::create(&db.pool, &pikachu()).await.unwrap();
    let bulba = CatalogService::create(
        &db.pool,
        &pokemon("Bulbasaur", &["grass"], &[("overgrow", false), ("chlorophyll", true)], &[]),
    )
    .await
    .unwrap();

    let got = CatalogService::get_by_name(&db.pool, "Pikachu").await.unwrap();
    assert_eq!(got.id, id);
    assert!(matches!(
        CatalogService::get_by_name(&db.pool, "pikachu").await,
        Err(AppError::NotFound(_))
    ));

    let hidden = CatalogService::list_hidden_abilities(&db.pool, 0, 20).await.unwrap();
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0].id, bulba);
    assert_eq!(hidden[0].name, "Bulbasaur");
    assert_eq!(
        hidden[0].hidden_abilities,
        vec![Ability { name: "chlorophyll".into(), is_hidden: true }]
    );
    assert!(CatalogService::list_hidden_abilities(&db.pool, 1, 20).await.unwrap().is_empty());
    db.drop_schema().await;
}

#[tokio::test]
async fn seeding_runs_once() {
    let Some(db) = test_db().await else { return };
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/pokedex.json");
    let inserted = pokedex::seed_if_empty(&db.pool, &path).await.unwrap();
    assert!(inserted >= 3);
    assert_eq!(pokedex::seed_if_empty(&db.pool, &path).await.unwrap(), 0);
    assert_eq!(table_counts(&db.pool).await[0], inserted as i64);
    db.drop_schema().await;
}
