use lowdoc::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
struct Customer {
    id: Uuid,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
#[document(collection = "departments")]
struct Department {
    #[document(id)]
    code: String,
    name: String,
}

#[test]
fn test_derive_uses_id_field_and_lowercased_name() {
    let customer = Customer { id: Uuid::new_v4(), name: "Acme".into() };

    assert_eq!(customer.id(), &customer.id);
    assert_eq!(Customer::collection_name(), "customer");
}

#[test]
fn test_derive_honors_attributes() {
    let department = Department { code: "RND".into(), name: "Research".into() };

    assert_eq!(department.id(), "RND");
    assert_eq!(Department::collection_name(), "departments");
}

#[test]
fn test_typed_collection_id_helpers() {
    let store = DocumentStore::new(MemoryAdapter::new());
    let customers = store.typed_collection::<Customer>().unwrap();
    let acme = Customer { id: Uuid::new_v4(), name: "Acme".into() };
    let globex = Customer { id: Uuid::new_v4(), name: "Globex".into() };
    customers.insert(acme.clone()).unwrap();
    customers.insert(globex.clone()).unwrap();

    assert_eq!(customers.find_by_id(&acme.id).unwrap(), Some(acme.clone()));

    let renamed = Customer { name: "Acme Corp".into(), ..acme.clone() };
    assert!(customers.update_by_id(renamed.clone()).unwrap());
    assert_eq!(customers.find_by_id(&acme.id).unwrap(), Some(renamed));

    assert!(customers.remove_by_id(&globex.id).unwrap());
    assert_eq!(customers.count(), 1);
    assert!(store.contains_collection("customer"));
}
