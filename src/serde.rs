use crate::ConcurrentBiMap;
use core::{
    fmt,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
};
use serde::{
    de::{SeqAccess, Visitor},
    ser::{SerializeSeq, Serializer},
    Deserializer, {Deserialize, Serialize},
};

struct ConcurrentBiMapVisitor<K, V, S> {
    marker: PhantomData<fn() -> ConcurrentBiMap<K, V, S>>,
}

impl<K, V, S> ConcurrentBiMapVisitor<K, V, S> {
    fn new() -> Self {
        ConcurrentBiMapVisitor {
            marker: PhantomData,
        }
    }
}

impl<'de, K, V, S> Visitor<'de> for ConcurrentBiMapVisitor<K, V, S>
where
    K: Deserialize<'de> + Eq + Hash + Clone,
    V: Deserialize<'de> + Eq + Hash + Clone,
    S: BuildHasher + Default,
{
    type Value = ConcurrentBiMap<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a sequence of key-value pairs")
    }

    fn visit_seq<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: SeqAccess<'de>,
    {
        let map: ConcurrentBiMap<K, V, S> = ConcurrentBiMap::with_capacity_and_hasher(
            access.size_hint().unwrap_or(0),
            Default::default(),
        );

        while let Some((key, value)) = access.next_element::<(K, V)>()? {
            map.insert(key, value);
        }

        Ok(map)
    }
}

impl<'de, K, V, S> Deserialize<'de> for ConcurrentBiMap<K, V, S>
where
    K: Deserialize<'de> + Eq + Hash + Clone,
    V: Deserialize<'de> + Eq + Hash + Clone,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(ConcurrentBiMapVisitor::<K, V, S>::new())
    }
}

// No length up front: concurrent writers can change it while the pairs are written.
impl<K, V, H> Serialize for ConcurrentBiMap<K, V, H>
where
    K: Serialize + Eq + Hash + Clone,
    V: Serialize + Eq + Hash + Clone,
    H: BuildHasher,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(None)?;

        for pair in self.iter() {
            seq.serialize_element(&pair)?;
        }

        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use crate::ConcurrentBiMap;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Hash, Debug)]
    struct TestingStruct {
        pub(crate) value: u64,
        pub(crate) data: String,
    }

    fn construct_default_map() -> ConcurrentBiMap<String, TestingStruct> {
        (0..10)
            .map(|i| (i.to_string(), TestingStruct::from_value(i)))
            .collect()
    }

    #[test]
    fn serialize_deserialize_test() {
        let map = construct_default_map();
        let jsonified: String =
            serde_json::to_string(&map).expect("Unable to convert data to json!");
        let reconstituted: ConcurrentBiMap<String, TestingStruct> =
            serde_json::from_str(&jsonified).expect("Unable to convert json to a bimap!");
        assert_eq!(map, reconstituted);
        assert_eq!(map.inverse(), reconstituted.inverse());
    }

    #[test]
    fn pairs_are_encoded_as_tuples() {
        let map: ConcurrentBiMap<String, u64> = ConcurrentBiMap::new();
        map.insert("a".to_string(), 1);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"[["a",1]]"#);
        let empty: ConcurrentBiMap<String, u64> = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
    }

    impl TestingStruct {
        pub(crate) fn from_value(value: u64) -> Self {
            Self {
                value,
                data: value.to_string(),
            }
        }
    }
}
