use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, Lines};
use std::ops::Mul;
use std::path::Path;
use num_traits::Float;

pub fn sqr<T>(x: T) -> T
where
    T: Mul<Output = T> + Copy,
{
    x * x
}

pub fn norm<T>(vector: &[T]) -> T
where
    T: Float,
{
    vector.iter()
        .map(|&x| x * x)
        .fold(T::zero(), |acc, x| acc + x)
        .sqrt()
}

pub fn openfile<P: AsRef<Path>>(path: P) -> io::Result<Lines<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(BufReader::new(file).lines())
}
