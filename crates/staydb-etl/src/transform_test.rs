use super::*;

fn table(csv: &str) -> Table {
    Table::from_csv_reader(csv.as_bytes()).unwrap()
}

const BOOKINGS: &str = "\
BookingId,PropertyId,Channel,RoomRate,Revenue,ADR,TouristTax,Status
B1,1,Airbnb,100,300,100,5,Confirmed
B2,2,,,200,,,
B3,9,Booking,200,,80,3,Confirmed
";

const PROPERTIES: &str = "\
PropertyId,RealProperty,Capacity,Square,PropertyType,NumBedrooms,ReadyDate,Status
1,Casa Sol,4,80,Apartment,2,2020-05-01,Active
2,,,,,,,
";

#[test]
fn left_join_keeps_every_booking_in_order() {
    let joined = left_join(&table(BOOKINGS), &table(PROPERTIES), JOIN_KEY).unwrap();

    assert_eq!(joined.len(), 3);
    assert_eq!(joined.cell(0, "BookingId"), Some("B1"));
    assert_eq!(joined.cell(1, "BookingId"), Some("B2"));
    assert_eq!(joined.cell(2, "BookingId"), Some("B3"));
    assert_eq!(joined.cell(0, "RealProperty"), Some("Casa Sol"));
    assert_eq!(joined.cell(2, "RealProperty"), None, "unmatched property is null");
}

#[test]
fn left_join_suffixes_shared_columns_and_keeps_key_once() {
    let joined = left_join(&table(BOOKINGS), &table(PROPERTIES), JOIN_KEY).unwrap();

    let headers = joined.headers();
    assert_eq!(headers.iter().filter(|h| *h == "PropertyId").count(), 1);
    assert!(headers.contains(&"Status_x".to_owned()));
    assert!(headers.contains(&"Status_y".to_owned()));
    assert!(!headers.contains(&"Status".to_owned()));
    assert_eq!(joined.cell(0, "Status_x"), Some("Confirmed"));
    assert_eq!(joined.cell(0, "Status_y"), Some("Active"));
}

#[test]
fn left_join_repeats_booking_per_matching_property() {
    let properties = table("PropertyId,RealProperty\n1,A\n1,B\n");
    let bookings = table("BookingId,PropertyId\nB1,1\nB2,\n");

    let joined = left_join(&bookings, &properties, JOIN_KEY).unwrap();

    assert_eq!(joined.len(), 3);
    assert_eq!(joined.cell(0, "RealProperty"), Some("A"));
    assert_eq!(joined.cell(1, "RealProperty"), Some("B"));
    assert_eq!(joined.cell(2, "BookingId"), Some("B2"));
    assert_eq!(joined.cell(2, "RealProperty"), None, "null key never matches");
}

#[test]
fn left_join_requires_key_on_both_sides() {
    let err = left_join(&table("A\n1\n"), &table(PROPERTIES), JOIN_KEY).unwrap_err();
    assert!(
        matches!(err, EtlError::MissingColumn { ref table, .. } if table == "bookings"),
        "got: {err:?}"
    );

    let err = left_join(&table(BOOKINGS), &table("A\n1\n"), JOIN_KEY).unwrap_err();
    assert!(matches!(err, EtlError::MissingColumn { ref table, .. } if table == "properties"));
}

#[test]
fn impute_fills_constants_and_means() {
    let mut joined = left_join(&table(BOOKINGS), &table(PROPERTIES), JOIN_KEY).unwrap();
    impute(&mut joined).unwrap();

    // Booking B2 matched a property row with every attribute missing.
    assert_eq!(joined.cell(1, "Channel"), Some("Unknown"));
    assert_eq!(joined.cell(1, "RoomRate"), Some("150.0"));
    assert_eq!(joined.cell(1, "ADR"), Some("90.0"));
    assert_eq!(joined.cell(1, "TouristTax"), Some("0"));
    assert_eq!(joined.cell(1, "RealProperty"), Some("Unknown"));
    assert_eq!(joined.cell(1, "Capacity"), Some("0"));
    assert_eq!(joined.cell(1, "Square"), Some("80.0"));
    assert_eq!(joined.cell(1, "PropertyType"), Some("Unknown"));
    assert_eq!(joined.cell(1, "NumBedrooms"), Some("0"));
    assert_eq!(joined.cell(1, "ReadyDate"), Some("1900-01-01"));

    // B3 is unmatched: property columns are imputed too.
    assert_eq!(joined.cell(2, "Revenue"), Some("250.0"));
    assert_eq!(joined.cell(2, "RealProperty"), Some("Unknown"));
    assert_eq!(joined.cell(2, "ReadyDate"), Some("1900-01-01"));

    // Present values are untouched.
    assert_eq!(joined.cell(0, "Channel"), Some("Airbnb"));
    assert_eq!(joined.cell(0, "RoomRate"), Some("100"));
}

#[test]
fn impute_keeps_fractional_means() {
    let mut joined = left_join(
        &table(
            "PropertyId,Channel,RoomRate,Revenue,ADR,TouristTax\n\
             1,A,1,1,1,0\n1,A,2,2,2,0\n1,A,2,2,2,0\n1,A,,,,\n",
        ),
        &table(
            "PropertyId,RealProperty,Capacity,Square,PropertyType,NumBedrooms,ReadyDate\n\
             1,x,1,1,y,1,2020-01-01\n",
        ),
        JOIN_KEY,
    )
    .unwrap();
    impute(&mut joined).unwrap();

    let mean: f64 = joined.cell(3, "RoomRate").unwrap().parse().unwrap();
    assert!((mean - 5.0 / 3.0).abs() < 1e-12);
}

#[test]
fn mean_column_without_values_stays_null() {
    let mut joined = left_join(
        &table("PropertyId,Channel,RoomRate,Revenue,ADR,TouristTax\n1,,,,,\n"),
        &table("PropertyId,RealProperty,Capacity,Square,PropertyType,NumBedrooms,ReadyDate\n"),
        JOIN_KEY,
    )
    .unwrap();
    impute(&mut joined).unwrap();

    assert_eq!(joined.cell(0, "RoomRate"), None);
    assert_eq!(joined.cell(0, "Square"), None);
    assert_eq!(joined.cell(0, "Channel"), Some("Unknown"));
}

#[test]
fn impute_rejects_non_numeric_mean_values() {
    let mut joined = left_join(
        &table("PropertyId,Channel,RoomRate,Revenue,ADR,TouristTax\n1,A,abc,1,1,0\n"),
        &table("PropertyId,RealProperty,Capacity,Square,PropertyType,NumBedrooms,ReadyDate\n"),
        JOIN_KEY,
    )
    .unwrap();

    let err = impute(&mut joined).unwrap_err();
    assert!(
        matches!(err, EtlError::InvalidNumber { ref column, row: 0, ref value }
            if column == "RoomRate" && value == "abc"),
        "got: {err:?}"
    );
}

#[test]
fn impute_requires_every_imputed_column() {
    let mut joined = table("PropertyId,Channel\n1,\n");
    let err = impute(&mut joined).unwrap_err();
    assert!(
        matches!(err, EtlError::MissingColumn { ref column, .. } if column == "RoomRate"),
        "got: {err:?}"
    );
}

#[test]
fn format_mean_matches_float_column_rendering() {
    assert_eq!(format_mean(150.0), "150.0");
    assert_eq!(format_mean(12.5), "12.5");
}
