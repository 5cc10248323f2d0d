/// SMT-LIB sort (type) representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sort {
    /// Boolean sort
    Bool,
    /// Mathematical integer sort
    Int,
    /// Real number sort
    Real,
    /// Array sort: `(Array index_sort element_sort)`
    Array(Box<Sort>, Box<Sort>),
}

impl Sort {
    /// Array sort indexed by `Int`, the only index sort the IR produces.
    pub fn int_array(element: Sort) -> Self {
        Sort::Array(Box::new(Sort::Int), Box::new(element))
    }
}
