//! End-to-end tests driving the SQL surface through an in-memory database.

use rusqlite::types::Value;
use rusqlite::{params, Connection};

fn connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    protosql_sqlite::register(&conn).unwrap();
    conn
}

fn append_varint(mut n: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (n & 0x7f) as u8;
        n >>= 7;
        if n != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if n == 0 {
            break;
        }
    }
}

fn varint_field(field_number: u32, n: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    append_varint(u64::from(field_number) << 3, &mut buf);
    append_varint(n, &mut buf);
    buf
}

fn len_field(field_number: u32, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    append_varint(u64::from(field_number) << 3 | 2, &mut buf);
    append_varint(payload.len() as u64, &mut buf);
    buf.extend_from_slice(payload);
    buf
}

fn extract(conn: &Connection, data: &[u8], path: &str, ty: &str) -> Value {
    conn.query_row(
        "SELECT protobuf_extract(?1, ?2, ?3)",
        params![data, path, ty],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn test_extract_int32_negative() {
    let conn = connection();
    let data = [0x08, 0xd6, 0xff, 0xff, 0xff, 0x0f];
    assert_eq!(extract(&conn, &data, "$.1", "int32"), Value::Integer(-42));
}

#[test]
fn test_extract_fixed64_bit_pattern() {
    let conn = connection();
    let data = [0x41, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    // SQLite integers are signed: u64::MAX surfaces as its bit pattern
    // (the unsigned-overflow warning goes to the log)
    assert_eq!(extract(&conn, &data, "$.8", "fixed64"), Value::Integer(-1));
    assert_eq!(extract(&conn, &data, "$.8", "sfixed64"), Value::Integer(-1));
}

#[test]
fn test_extract_float_as_double() {
    let conn = connection();
    let data = [0x6d, 0x00, 0x00, 0x28, 0xc2];
    assert_eq!(extract(&conn, &data, "$.13", "float"), Value::Real(-42.0));
}

#[test]
fn test_extract_nested() {
    let conn = connection();
    let data = [0x0a, 0x02, 0x08, 0x2a];
    assert_eq!(extract(&conn, &data, "$.1.1", "int32"), Value::Integer(42));
}

#[test]
fn test_extract_repeated_indexing() {
    let conn = connection();
    let mut data = Vec::new();
    for i in 0..64 {
        data.extend_from_slice(&varint_field(1, 1u64 << i));
    }
    assert_eq!(
        extract(&conn, &data, "$.1[63]", "int64"),
        Value::Integer(i64::MIN)
    );
    assert_eq!(
        extract(&conn, &data, "$.1[-1]", "int64"),
        Value::Integer(i64::MIN)
    );
    assert_eq!(extract(&conn, &data, "$.1[0]", "int64"), Value::Integer(1));
    assert_eq!(extract(&conn, &data, "$.1[-64]", "int64"), Value::Integer(1));
    assert_eq!(extract(&conn, &data, "$.1[64]", "int64"), Value::Null);
    assert_eq!(extract(&conn, &data, "$.1[-65]", "int64"), Value::Null);
}

#[test]
fn test_extract_varint_types() {
    let conn = connection();
    let mut data = Vec::new();
    data.extend_from_slice(&varint_field(1, (-42i64) as u64));
    data.extend_from_slice(&varint_field(2, 0x53)); // zig-zag -42
    data.extend_from_slice(&varint_field(3, 1));
    data.extend_from_slice(&varint_field(4, u64::MAX));
    assert_eq!(extract(&conn, &data, "$.1", "int64"), Value::Integer(-42));
    assert_eq!(extract(&conn, &data, "$.2", "sint32"), Value::Integer(-42));
    assert_eq!(extract(&conn, &data, "$.2", "sint64"), Value::Integer(-42));
    assert_eq!(extract(&conn, &data, "$.3", "bool"), Value::Integer(1));
    assert_eq!(extract(&conn, &data, "$.3", "enum"), Value::Integer(1));
    assert_eq!(extract(&conn, &data, "$.4", "uint64"), Value::Integer(-1));
}

#[test]
fn test_extract_string_bytes_buffer() {
    let conn = connection();
    let data = len_field(1, b"hello");
    assert_eq!(
        extract(&conn, &data, "$.1", "string"),
        Value::Text("hello".to_owned())
    );
    assert_eq!(
        extract(&conn, &data, "$.1", "bytes"),
        Value::Blob(b"hello".to_vec())
    );
    assert_eq!(
        extract(&conn, &data, "$.1", ""),
        Value::Blob(b"hello".to_vec())
    );
}

#[test]
fn test_extract_missing_field_is_null() {
    let conn = connection();
    let data = varint_field(1, 42);
    assert_eq!(extract(&conn, &data, "$.2", "int32"), Value::Null);
    assert_eq!(extract(&conn, &data, "$.1.1", "int32"), Value::Null);
    // Wire-type mismatch is also the missing-field signal
    assert_eq!(extract(&conn, &data, "$.1", "string"), Value::Null);
}

#[test]
fn test_extract_packed_payload() {
    let conn = connection();
    // Three varints packed into one LEN field; not a valid message
    let data = len_field(4, &[200, 1, 201, 1, 202, 1]);
    assert_eq!(extract(&conn, &data, "$.4[0]", "int32"), Value::Integer(200));
    assert_eq!(extract(&conn, &data, "$.4[2]", "int32"), Value::Integer(202));
    assert_eq!(extract(&conn, &data, "$.4[-3]", "int32"), Value::Integer(200));
    assert_eq!(extract(&conn, &data, "$.4[3]", "int32"), Value::Null);
    // The LEN wrapper is still addressable as bytes
    assert_eq!(
        extract(&conn, &data, "$.4", "bytes"),
        Value::Blob(vec![200, 1, 201, 1, 202, 1])
    );
}

#[test]
fn test_extract_invalid_path() {
    let conn = connection();
    let data = varint_field(1, 1);
    for path in ["", "1", "x$.1", "$x", "$.", "$.1[", "$.1[]", "$"] {
        let err = conn
            .query_row(
                "SELECT protobuf_extract(?1, ?2, 'int32')",
                params![&data, path],
                |row| row.get::<_, Value>(0),
            )
            .unwrap_err();
        assert!(
            err.to_string().contains("Path not valid"),
            "path {path:?} gave {err}"
        );
    }
}

#[test]
fn test_extract_invalid_type() {
    let conn = connection();
    let data = varint_field(1, 1);
    let err = conn
        .query_row(
            "SELECT protobuf_extract(?1, '$.1', 'varchar')",
            params![&data],
            |row| row.get::<_, Value>(0),
        )
        .unwrap_err();
    assert!(err.to_string().contains("Type not valid"));
}

#[test]
fn test_extract_arity_is_fixed() {
    let conn = connection();
    assert!(conn
        .query_row("SELECT protobuf_extract(x'082a', '$.1')", [], |row| row
            .get::<_, Value>(0))
        .is_err());
}

#[test]
fn test_extract_over_table_rows() {
    // Exercises the per-call-site path/type memoisation across rows
    let conn = connection();
    conn.execute("CREATE TABLE events (id INTEGER, data BLOB)", [])
        .unwrap();
    for i in 0..50u64 {
        conn.execute(
            "INSERT INTO events VALUES (?1, ?2)",
            params![i as i64, varint_field(1, i)],
        )
        .unwrap();
    }
    let sum: i64 = conn
        .query_row(
            "SELECT sum(protobuf_extract(data, '$.1', 'int64')) FROM events",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(sum, (0..50).sum::<i64>());
}

#[test]
fn test_to_json_modes() {
    let conn = connection();
    let data: [u8; 7] = [0x0a, 0x05, 0x68, 0x65, 0x6c, 0x6c, 0x6f];
    let json: String = conn
        .query_row("SELECT protobuf_to_json(?1)", params![&data[..]], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(json, r#"{"1":"hello"}"#);

    let json: String = conn
        .query_row(
            "SELECT protobuf_to_json(?1, 1)",
            params![&data[..]],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(json, r#"{"1_2":"hello"}"#);
}

#[test]
fn test_to_json_packed_mode() {
    let conn = connection();
    // Two varints that only unpack when mode bit 1 is set
    let data = len_field(1, &[0x05, 0x06]);
    let plain: String = conn
        .query_row("SELECT protobuf_to_json(?1)", params![&data], |row| {
            row.get(0)
        })
        .unwrap();
    // Non-printable payload renders as base64
    assert_eq!(plain, r#"{"1":"BQY="}"#);

    let packed: String = conn
        .query_row("SELECT protobuf_to_json(?1, 2)", params![&data], |row| {
            row.get(0)
        })
        .unwrap();
    // Unpacked varint siblings share the field number with the wrapper
    assert_eq!(packed, r#"{"1":[5,6],"1":"BQY="}"#);
}

#[test]
fn test_to_json_arity() {
    let conn = connection();
    let err = conn
        .query_row("SELECT protobuf_to_json(x'082a', 0, 0)", [], |row| {
            row.get::<_, String>(0)
        })
        .unwrap_err();
    assert!(err.to_string().contains("Wrong number of arguments"));
}

#[test]
fn test_foreach_rows() {
    let conn = connection();
    // The LEN payload is picked so no packed reinterpretation applies:
    // an unterminated varint, and a length divisible by neither 4 nor 8
    let mut data = Vec::new();
    data.extend_from_slice(&varint_field(1, 42));
    data.extend_from_slice(&len_field(2, &[0xff, 0xff]));
    data.extend_from_slice(&varint_field(1, 43));

    let mut stmt = conn
        .prepare("SELECT rowid, tag, field, wiretype, value FROM protobuf_foreach(?1)")
        .unwrap();
    let rows: Vec<(i64, i64, i64, i64, Vec<u8>)> = stmt
        .query_map(params![&data], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            ))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        rows,
        vec![
            (0, 0x08, 1, 0, vec![42]),
            (1, 0x12, 2, 2, vec![0xff, 0xff]),
            (2, 0x08, 1, 0, vec![43]),
        ]
    );
}

#[test]
fn test_foreach_root_path() {
    let conn = connection();
    let inner = {
        let mut buf = Vec::new();
        buf.extend_from_slice(&varint_field(1, 7));
        buf.extend_from_slice(&varint_field(2, 8));
        buf
    };
    let data = len_field(3, &inner);

    let fields: Vec<i64> = conn
        .prepare("SELECT field FROM protobuf_foreach(?1, '$.3')")
        .unwrap()
        .query_map(params![&data], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(fields, vec![1, 2]);

    // parent echoes the resolved root's payload, buffer the whole message
    let (parent, buffer): (Vec<u8>, Vec<u8>) = conn
        .query_row(
            "SELECT parent, buffer FROM protobuf_foreach(?1, '$.3') LIMIT 1",
            params![&data],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(parent, inner);
    assert_eq!(buffer, data);
}

#[test]
fn test_foreach_root_column_echo() {
    let conn = connection();
    let data = len_field(3, &varint_field(1, 7));
    let root: String = conn
        .query_row(
            "SELECT root FROM protobuf_foreach(?1, '$.3') LIMIT 1",
            params![&data],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(root, "$.3");

    let root: String = conn
        .query_row(
            "SELECT root FROM protobuf_foreach(?1) LIMIT 1",
            params![&data],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(root, "$");
}

#[test]
fn test_foreach_unresolved_root_is_empty() {
    let conn = connection();
    let data = varint_field(1, 42);
    let count: i64 = conn
        .query_row(
            "SELECT count(*) FROM protobuf_foreach(?1, '$.9')",
            params![&data],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_foreach_invalid_root_raises() {
    let conn = connection();
    let data = varint_field(1, 42);
    let err = conn
        .query_row(
            "SELECT count(*) FROM protobuf_foreach(?1, 'nope')",
            params![&data],
            |row| row.get::<_, i64>(0),
        )
        .unwrap_err();
    assert!(err.to_string().contains("Path not valid"));
}

#[test]
fn test_foreach_each_alias() {
    let conn = connection();
    let data = varint_field(1, 42);
    let count: i64 = conn
        .query_row(
            "SELECT count(*) FROM protobuf_each(?1)",
            params![&data],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_foreach_order_by_rowid() {
    let conn = connection();
    let mut data = Vec::new();
    for i in 0..5u64 {
        data.extend_from_slice(&varint_field(1, i));
    }
    let values: Vec<Vec<u8>> = conn
        .prepare("SELECT value FROM protobuf_foreach(?1) ORDER BY rowid ASC")
        .unwrap()
        .query_map(params![&data], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        values,
        (0..5u8).map(|i| vec![i]).collect::<Vec<_>>()
    );
}

#[test]
fn test_foreach_empty_message() {
    let conn = connection();
    let count: i64 = conn
        .query_row(
            "SELECT count(*) FROM protobuf_foreach(?1)",
            params![&b""[..]],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_foreach_group_rows() {
    let conn = connection();
    // field 1 group wrapping a varint, then a trailing varint
    let mut data = Vec::new();
    data.push(0x0b); // field 1 SGROUP
    data.extend_from_slice(&varint_field(2, 5));
    data.push(0x0c); // field 1 EGROUP
    data.extend_from_slice(&varint_field(3, 6));

    let rows: Vec<(i64, i64)> = conn
        .prepare("SELECT field, wiretype FROM protobuf_foreach(?1)")
        .unwrap()
        .query_map(params![&data], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    // The group-end tag is consumed, not reported as a row
    assert_eq!(rows, vec![(1, 3), (3, 0)]);
}
