use estimate_tool::{
    CalculationRequest, CatalogEntry, CrewRounding, ElementCatalog, ElementInput, ElementRequest,
    EstimateBuilder, EstimateError, EstimatorError, RateEstimator, UnitPrediction,
    ValidationError,
};
use std::cell::RefCell;

fn catalog() -> ElementCatalog {
    ElementCatalog::new(vec![
        CatalogEntry::new("Brickwork", "m2").with_default_crew(2),
        CatalogEntry::new("Flooring", "m2"),
        CatalogEntry::new("Windows", "nr").with_default_crew(3),
    ])
    .unwrap()
}

/// One day per unit for every crew, 50 per unit.
fn flat(_quantity: f64, _crew: u32) -> Result<UnitPrediction, EstimatorError> {
    Ok(UnitPrediction::new(1.0, 50.0))
}

#[test]
fn builds_breakdown_and_totals() {
    let catalog = catalog();
    let requests = vec![
        ElementRequest::new("Brickwork", 10.0, 2),
        ElementRequest::new("Flooring", 20.0, 1),
    ];
    let estimate = EstimateBuilder::new(&catalog, &flat)
        .build("House", &requests, 15.0)
        .unwrap();

    assert_eq!(estimate.project_name, "House");
    assert_eq!(estimate.elements.len(), 2);
    assert_eq!(estimate.total_cost, 1500.0);
    assert_eq!(estimate.total_baseline_days, 30.0);
    assert_eq!(estimate.total_allocated_days, 15.0);
    assert_eq!(estimate.scale_factor, 0.5);
    assert_eq!(estimate.peak_crew_size, 4);
    assert_eq!(estimate.total_crew, 6);

    let brickwork = estimate.element("Brickwork").unwrap();
    assert_eq!(brickwork.unit, "m2");
    assert_eq!(brickwork.cost, 500.0);
    assert_eq!(brickwork.baseline_days, 10.0);
    assert_eq!(brickwork.allocated_days, 5.0);
    assert_eq!(brickwork.crew_needed, 4);
    assert!(estimate.is_compressed());
}

#[test]
fn non_positive_quantities_are_excluded() {
    let catalog = catalog();
    let requests = vec![
        ElementRequest::new("Brickwork", 0.0, 2),
        ElementRequest::new("Flooring", 12.0, 1),
    ];
    let estimate = EstimateBuilder::new(&catalog, &flat)
        .build("House", &requests, 0.0)
        .unwrap();
    assert_eq!(estimate.elements.len(), 1);
    assert_eq!(estimate.elements[0].element_id, "Flooring");
}

#[test]
fn nothing_requested_gives_empty_estimate() {
    let catalog = catalog();
    let requests = vec![ElementRequest::new("Brickwork", 0.0, 2)];
    let estimate = EstimateBuilder::new(&catalog, &flat)
        .build("Empty", &requests, 10.0)
        .unwrap();

    assert!(estimate.is_empty());
    assert_eq!(estimate.total_cost, 0.0);
    assert_eq!(estimate.total_baseline_days, 0.0);
    assert_eq!(estimate.total_allocated_days, 0.0);
    assert_eq!(estimate.peak_crew_size, 0);
}

#[test]
fn unknown_elements_are_skipped() {
    let catalog = catalog();
    let requests = vec![
        ElementRequest::new("Gold Leaf", 3.0, 1),
        ElementRequest::new("Windows", 4.0, 2),
    ];
    let estimate = EstimateBuilder::new(&catalog, &flat)
        .build("House", &requests, 0.0)
        .unwrap();
    assert_eq!(estimate.elements.len(), 1);
    assert_eq!(estimate.elements[0].unit, "nr");
}

#[test]
fn estimator_sees_quantity_and_crew_as_given() {
    let catalog = catalog();
    let calls = RefCell::new(Vec::new());
    let recording = |quantity: f64, crew: u32| -> Result<UnitPrediction, EstimatorError> {
        calls.borrow_mut().push((quantity, crew));
        Ok(UnitPrediction::new(0.5, 10.0))
    };
    let requests = vec![
        ElementRequest::new("Brickwork", 8.0, 0),
        ElementRequest::new("Flooring", 2.5, 3),
    ];
    EstimateBuilder::new(&catalog, &recording)
        .build("House", &requests, 0.0)
        .unwrap();
    assert_eq!(*calls.borrow(), vec![(8.0, 0), (2.5, 3)]);
}

#[test]
fn estimator_failure_aborts_the_calculation() {
    let catalog = catalog();
    let requests = vec![
        ElementRequest::new("Brickwork", 10.0, 2),
        ElementRequest::new("Flooring", 20.0, 0),
    ];
    let estimator = RateEstimator::default();
    let err = EstimateBuilder::new(&catalog, &estimator)
        .build("House", &requests, 0.0)
        .unwrap_err();
    match err {
        EstimateError::Estimator { element_id, source } => {
            assert_eq!(element_id, "Flooring");
            assert!(matches!(source, EstimatorError::InvalidCrewSize(0)));
        }
    }
}

#[test]
fn ceil_rounding_is_passed_to_the_compressor() {
    let catalog = catalog();
    let requests = vec![
        ElementRequest::new("Brickwork", 10.0, 2),
        ElementRequest::new("Flooring", 20.0, 1),
    ];
    let estimate = EstimateBuilder::new(&catalog, &flat)
        .with_rounding(CrewRounding::Ceil)
        .build("House", &requests, 21.0)
        .unwrap();
    assert_eq!(estimate.peak_crew_size, 3);
}

#[test]
fn calculation_request_fills_crew_from_catalog() {
    let catalog = catalog();
    let request = CalculationRequest {
        project_name: "Extension".into(),
        time_frame_days: 30.0,
        elements: vec![
            ElementInput::new("Brickwork", 10.0, None),
            ElementInput::new("Flooring", 5.0, None),
            ElementInput::new("Windows", 2.0, Some(1)),
        ],
        ..CalculationRequest::default()
    };
    let requests = request.element_requests(&catalog).unwrap();
    let crews: Vec<u32> = requests.iter().map(|r| r.crew_size).collect();
    assert_eq!(crews, vec![2, 1, 1]);
}

#[test]
fn calculation_request_rejects_bad_input() {
    let catalog = catalog();

    let mut request = CalculationRequest::default();
    request.elements = vec![ElementInput::new("Brickwork", -1.0, Some(2))];
    assert!(matches!(
        request.element_requests(&catalog),
        Err(ValidationError::InvalidQuantity { .. })
    ));

    request.elements = vec![ElementInput::new("Brickwork", 1.0, Some(-2))];
    assert!(matches!(
        request.element_requests(&catalog),
        Err(ValidationError::InvalidCrewSize { crew_size: -2, .. })
    ));

    request.elements = vec![
        ElementInput::new("Brickwork", 1.0, None),
        ElementInput::new(" Brickwork ", 2.0, None),
    ];
    assert_eq!(
        request.element_requests(&catalog),
        Err(ValidationError::DuplicateElement("Brickwork".into()))
    );

    request.elements.clear();
    request.time_frame_days = -5.0;
    assert_eq!(
        request.element_requests(&catalog),
        Err(ValidationError::InvalidTimeFrame(-5.0))
    );
}

#[test]
fn estimate_renders_as_dataframe() {
    let catalog = catalog();
    let requests = vec![
        ElementRequest::new("Brickwork", 10.0, 2),
        ElementRequest::new("Flooring", 20.0, 1),
    ];
    let estimate = EstimateBuilder::new(&catalog, &flat)
        .build("House", &requests, 15.0)
        .unwrap();
    let df = estimate.to_dataframe().unwrap();
    assert_eq!(df.height(), 2);
    let needed: Vec<Option<u32>> = df
        .column("crew_needed")
        .unwrap()
        .u32()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(needed, vec![Some(4), Some(2)]);

    let summary = estimate.summary().to_cli_summary();
    assert!(summary.contains("elements=2"));
    assert!(summary.contains("compressed=2"));
    assert!(summary.contains("peak_crew=4"));
}

#[test]
fn country_defaults_to_uk_and_can_be_set() {
    let catalog = catalog();
    let requests = vec![ElementRequest::new("Brickwork", 10.0, 2)];

    let estimate = EstimateBuilder::new(&catalog, &flat)
        .build("House", &requests, 0.0)
        .unwrap();
    assert_eq!(estimate.country, "UK");
    assert_eq!(CalculationRequest::default().country, "UK");

    let estimate = EstimateBuilder::new(&catalog, &flat)
        .with_country("Ireland")
        .build("House", &requests, 0.0)
        .unwrap();
    assert_eq!(estimate.country, "Ireland");

    let request: CalculationRequest =
        serde_json::from_str(r#"{"time_frame_days": 5, "elements": []}"#).unwrap();
    assert_eq!(request.country, "UK");
}
