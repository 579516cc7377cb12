use catalog_agg::{GridId, GridRecord, GridTable, ParamRecord, ParamTable, VariableResolver};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const VARIABLES: [&str; 6] = ["prcp", "srad", "swe", "tmax", "tmin", "vp"];

fn synthetic_catalogs() -> (ParamTable, GridTable) {
    let mut params = Vec::new();
    for dataset in 0..500 {
        for variable in VARIABLES {
            params.push(ParamRecord {
                id: format!("dataset{dataset}"),
                grid_id: Some(GridId(f64::from(dataset % 50))),
                variable: Some(variable.to_string()),
                ..Default::default()
            });
        }
    }
    params.extend(VARIABLES.iter().map(|variable| ParamRecord {
        id: "daymet4".to_string(),
        grid_id: Some(GridId(3.0)),
        variable: Some(variable.to_string()),
        ..Default::default()
    }));

    let grids = (0..50)
        .map(|id| GridRecord {
            grid_id: Some(GridId(f64::from(id))),
            ..Default::default()
        })
        .collect();
    (ParamTable::new(params), grids)
}

fn bench_resolve(c: &mut Criterion) {
    let (params, grids) = synthetic_catalogs();
    let resolver = VariableResolver::new(&params, &grids);

    c.bench_function("resolve_daymet_6_vars", |b| {
        b.iter(|| resolver.resolve(black_box("daymet4"), Some(GridId(3.0)), &VARIABLES))
    });
    c.bench_function("resolve_params_any_grid", |b| {
        b.iter(|| resolver.resolve_params(black_box("dataset42"), None, &VARIABLES))
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
