// tests/field_mapping_tests.rs
use fieldio::mapping::copy_surface_level;
use fieldio::*;
use proptest::prelude::*;
use std::sync::Arc;

fn grid(points: usize) -> Arc<Grid> {
    let lonlat = (0..points).map(|i| (i as f64, 0.0)).collect();
    Arc::new(Grid::new("test_grid", lonlat))
}

fn file_data_with_map(index_map: Vec<usize>) -> FileData {
    let mut file_data = FileData::for_grid("test_grid");
    let points = index_map.len();
    let metadata = file_data.metadata_mut();
    metadata.add_dimension("nMesh2d_face", points);
    metadata.add_dimension("full_levels", 71);
    metadata.add_dimension("half_levels", 70);
    file_data.set_index_map(index_map);
    file_data
}

fn theta_metadata(no_first_level: bool) -> FieldMetadata {
    FieldMetadata::new("air_potential_temperature", "theta", "theta_inc")
        .with_units("K")
        .with_no_first_level(no_first_level)
        .with_vert_config("full_levels", "half_levels")
}

#[test]
fn test_half_level_field_round_trip_through_full_level_file() {
    let config = IoConfig::default();
    let field_writer = FieldWriter::new(0, &config);
    let field_reader = FieldReader::new(0, &config);
    let index_map = vec![1, 0];
    let metadata = theta_metadata(true);

    // 2 points x 70 half levels, value = 1000 * point + level
    let values: Vec<f64> = (0..2)
        .flat_map(|i| (0..70).map(move |j| (1000 * i + j) as f64))
        .collect();
    let mut field = Field::from_values("air_potential_temperature", values.clone(), 70, grid(2)).unwrap();

    let mut file_data = file_data_with_map(index_map.clone());
    field_writer
        .populate_file_data_with_field(&mut file_data, &mut field, &metadata, "theta", "full_levels", true)
        .unwrap();

    let variable = file_data.metadata().variable("theta").unwrap();
    assert_eq!(variable.dimension_names(), vec!["full_levels", "nMesh2d_face"]);
    assert_eq!(variable.str_attr("units").unwrap(), "K");

    let written = file_data.data().container("theta").unwrap().data::<f64>().unwrap();
    assert_eq!(written.len(), 71 * 2);
    // surface duplicated: file levels 0 and 1 both hold field level 0
    assert_eq!(written[0], 1000.0);
    assert_eq!(written[1], 0.0);
    assert_eq!(written[2], 1000.0);
    assert_eq!(written[3], 0.0);
    assert_eq!(written[70 * 2 + 1], 69.0);

    let mut read_back = Field::new("air_potential_temperature", DataType::Double, 2, 70, grid(2)).unwrap();
    field_reader
        .populate_field_with_file_data(&mut read_back, &file_data, &metadata, "theta", true)
        .unwrap();
    assert_eq!(read_back.values::<f64>().unwrap(), values.as_slice());
}

#[test]
fn test_full_level_field_kept_as_is() {
    let config = IoConfig::default();
    let field_writer = FieldWriter::new(0, &config);
    let values: Vec<i32> = (0..71).collect();
    let mut field = Field::from_values("rho", values, 71, grid(1)).unwrap();
    let metadata = FieldMetadata::new("rho", "rho", "rho_inc").with_vert_config("full_levels", "");

    let mut file_data = file_data_with_map(vec![0]);
    field_writer
        .populate_file_data_with_field(&mut file_data, &mut field, &metadata, "rho_inc", "full_levels", true)
        .unwrap();

    // LFRic writes rename the field in place
    assert_eq!(field.name(), "rho_inc");
    let written = file_data.data().container("rho_inc").unwrap().data::<i32>().unwrap();
    assert_eq!(written, (0..71).collect::<Vec<i32>>().as_slice());
}

#[test]
fn test_no_first_level_on_full_levels_is_rejected_both_ways() {
    let config = IoConfig::default();
    let metadata = theta_metadata(true);
    let mut field = Field::new("air_potential_temperature", DataType::Float, 1, 71, grid(1)).unwrap();
    let mut file_data = file_data_with_map(vec![0]);

    match FieldWriter::new(0, &config).populate_file_data_with_field(
        &mut file_data,
        &mut field,
        &metadata,
        "theta",
        "full_levels",
        true,
    ) {
        Err(FieldIoError::LevelMisconfiguration { levels, .. }) => assert_eq!(levels, 71),
        other => panic!("Expected LevelMisconfiguration, got {:?}", other),
    }

    let container = DataContainer::from_values("theta", vec![0.0f32; 71]);
    match FieldReader::new(0, &config).populate_field_with_container(&mut field, &container, &[0], true, true) {
        Err(FieldIoError::LevelMisconfiguration { levels, .. }) => assert_eq!(levels, 71),
        other => panic!("Expected LevelMisconfiguration, got {:?}", other),
    }
}

#[test]
fn test_jedi_convention_reads_surface() {
    let config = IoConfig::default();
    let field_reader = FieldReader::new(0, &config);
    let values: Vec<f32> = (0..70).map(|v| v as f32).collect();
    let container = DataContainer::from_values("air_potential_temperature", values.clone());
    let mut field = Field::new("air_potential_temperature", DataType::Float, 1, 70, grid(1)).unwrap();

    field_reader
        .populate_field_with_container(&mut field, &container, &[0], true, false)
        .unwrap();
    assert_eq!(field.values::<f32>().unwrap(), values.as_slice());
}

#[test]
fn test_missing_variable_name_cannot_be_written() {
    let config = IoConfig::default();
    let mut field = Field::new("height", DataType::Double, 1, 71, grid(1)).unwrap();
    let metadata = FieldMetadata::new("height", "height", "height");
    let mut file_data = file_data_with_map(vec![0]);

    match FieldWriter::new(0, &config).populate_file_data_with_field(
        &mut file_data,
        &mut field,
        &metadata,
        "height",
        "",
        true,
    ) {
        Err(FieldIoError::Misconfigured(message)) => assert!(message.contains("height")),
        other => panic!("Expected Misconfigured, got {:?}", other),
    }
}

#[test]
fn test_copy_surface_level_int() {
    let field = Field::from_values("f", vec![1i32, 2, 3, 4], 2, grid(2)).unwrap();
    let taller = copy_surface_level::<i32>(&field, "g").unwrap();

    assert_eq!(taller.name(), "g");
    assert_eq!(taller.shape(), (2, 3));
    assert_eq!(taller.values::<i32>().unwrap(), &[1, 1, 2, 3, 3, 4]);
}

#[test]
fn test_written_metadata_carries_convention() {
    let config = IoConfig::default();
    let mut field = Field::new("air_potential_temperature", DataType::Double, 1, 70, grid(1)).unwrap();
    let metadata = theta_metadata(false);
    let mut file_data = file_data_with_map(vec![0]);

    FieldWriter::new(0, &config)
        .populate_file_data_with_field(
            &mut file_data,
            &mut field,
            &metadata,
            "air_potential_temperature",
            "half_levels",
            false,
        )
        .unwrap();

    let metadata = file_data.metadata();
    assert_eq!(metadata.variable_convention(), Convention::Jedi);
    let variable = metadata.variable("air_potential_temperature").unwrap();
    assert_eq!(variable.dimension_names(), vec!["half_levels", "nMesh2d_face"]);
    assert_eq!(variable.str_attr("long_name").unwrap(), "air_potential_temperature_inc");
    assert_eq!(variable.str_attr("coordinates").unwrap(), "Mesh2d_face_y Mesh2d_face_x");
}

fn mapping_case() -> impl Strategy<Value = (Vec<usize>, usize, Vec<f64>)> {
    (1usize..16, 1usize..6).prop_flat_map(|(points, levels)| {
        (
            Just((0..points).collect::<Vec<usize>>()).prop_shuffle(),
            Just(levels),
            prop::collection::vec(-1.0e6f64..1.0e6, points * levels),
        )
    })
}

proptest! {
    #[test]
    fn prop_read_inverts_write((index_map, levels, values) in mapping_case()) {
        let config = IoConfig::default();
        let points = index_map.len();
        let metadata = FieldMetadata::new("f", "f", "f");
        let mut field = Field::from_values("f", values.clone(), levels, grid(points)).unwrap();

        let mut file_data = FileData::new();
        file_data.set_index_map(index_map.clone());
        FieldWriter::new(0, &config)
            .populate_file_data_with_field(&mut file_data, &mut field, &metadata, "f", "", false)
            .unwrap();

        let written = file_data.data().container("f").unwrap().data::<f64>().unwrap();
        for i in 0..points {
            for level in 0..levels {
                prop_assert_eq!(written[index_map[i] + level * points], values[i * levels + level]);
            }
        }

        let mut read_back = Field::new("f", DataType::Double, points, levels, grid(points)).unwrap();
        FieldReader::new(0, &config)
            .populate_field_with_file_data(&mut read_back, &file_data, &metadata, "f", false)
            .unwrap();
        prop_assert_eq!(read_back.values::<f64>().unwrap(), values.as_slice());
    }
}

fn lfric_case() -> impl Strategy<Value = (Vec<usize>, usize, bool, Vec<i32>)> {
    (1usize..12, 1usize..6, any::<bool>()).prop_flat_map(|(points, half_levels, no_first_level)| {
        let levels = if no_first_level { half_levels } else { half_levels + 1 };
        (
            Just((0..points).collect::<Vec<usize>>()).prop_shuffle(),
            Just(half_levels),
            Just(no_first_level),
            prop::collection::vec(-1_000_000i32..1_000_000, points * levels),
        )
    })
}

fn lfric_round_trip<T: Element>(
    index_map: &[usize],
    half_levels: usize,
    no_first_level: bool,
    values: Vec<T>,
) -> std::result::Result<(), TestCaseError> {
    let config = IoConfig {
        full_levels: half_levels + 1,
        half_levels,
        ..IoConfig::default()
    };
    let points = index_map.len();
    let levels = values.len() / points;
    let metadata = FieldMetadata::new("f", "f", "f_inc").with_no_first_level(no_first_level);
    let mut field = Field::from_values("f", values.clone(), levels, grid(points)).unwrap();

    let mut file_data = FileData::new();
    file_data.set_index_map(index_map.to_vec());
    FieldWriter::new(0, &config)
        .populate_file_data_with_field(&mut file_data, &mut field, &metadata, "f_inc", "", true)
        .unwrap();

    let written = file_data.data().container("f_inc").unwrap().data::<T>().unwrap();
    prop_assert_eq!(written.len(), points * (half_levels + 1));
    if no_first_level {
        for mapped in index_map {
            prop_assert_eq!(written[*mapped], written[*mapped + points]);
        }
    }

    let mut read_back = Field::new("f", T::DATA_TYPE, points, levels, grid(points)).unwrap();
    FieldReader::new(0, &config)
        .populate_field_with_file_data(&mut read_back, &file_data, &metadata, "f_inc", true)
        .unwrap();
    prop_assert_eq!(read_back.values::<T>().unwrap(), values.as_slice());
    Ok(())
}

proptest! {
    #[test]
    fn prop_lfric_read_inverts_write(
        (index_map, half_levels, no_first_level, values) in lfric_case(),
        element in 0usize..3,
    ) {
        match element {
            0 => {
                let values: Vec<f64> = values.iter().map(|v| *v as f64).collect();
                lfric_round_trip(&index_map, half_levels, no_first_level, values)?
            }
            1 => {
                let values: Vec<f32> = values.iter().map(|v| *v as f32).collect();
                lfric_round_trip(&index_map, half_levels, no_first_level, values)?
            }
            _ => lfric_round_trip(&index_map, half_levels, no_first_level, values)?,
        }
    }
}
