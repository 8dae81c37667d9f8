use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ddf_core::{core_attributes, tags, Metacard};
use ddf_policy::{LifecycleEvent, PolicyConfig, PolicyContext, XmlAttributeHarvester, XmlAttributeHarvesterConfig};

const POLICY: &str = r#"
[registry]
create_access = ["role=registry-writer"]
read_access = ["role=guest"]

[metacard_attributes]
attributes = ["security.access-groups", "security.access-individuals"]

[xml_attributes]
elements = ["Security"]
intersections = ["releasableTo"]
"#;

const METADATA: &str = r#"<record>
  <Security classification="U" releasableTo="USA CAN GBR AUS NZL" ownerProducer="USA"/>
  <title>Report</title>
  <Security classification="U" releasableTo="USA GBR" ownerProducer="CAN"/>
</record>"#;

fn sample_metacard() -> Metacard {
    Metacard::new("bench-1")
        .with_tag(tags::REGISTRY)
        .with_attribute(core_attributes::SECURITY_ACCESS_GROUPS, ["ops", "intel", "admin"])
        .with_attribute(core_attributes::METADATA, [METADATA])
}

fn bench_aggregator(c: &mut Criterion) {
    let aggregator = PolicyConfig::from_toml(POLICY).expect("parse policy").build_aggregator();
    let metacard = sample_metacard();

    c.bench_function("policy/aggregate_post_query", |b| {
        b.iter(|| {
            let ctx = PolicyContext::new(LifecycleEvent::PostQuery(black_box(&metacard)));
            let response = aggregator.evaluate(&ctx).expect("no stop");
            black_box(response.item_policy.len());
        });
    });
}

fn bench_xml_harvest(c: &mut Criterion) {
    let harvester = XmlAttributeHarvester::new(&XmlAttributeHarvesterConfig {
        elements: vec!["Security".to_string()],
        intersections: vec!["releasableTo".to_string()],
        ..Default::default()
    });

    c.bench_function("policy/xml_harvest", |b| {
        b.iter(|| {
            let policy = harvester.try_harvest(black_box(METADATA)).expect("harvest");
            black_box(policy.len());
        });
    });
}

criterion_group!(benches, bench_aggregator, bench_xml_harvest);
criterion_main!(benches);
