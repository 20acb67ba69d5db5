// Integer File Sort Benchmark
// Usage: int_sort <input> <output>
// Reads little-endian i32 values from <input>, sorts them in place, writes them to <output>.
// A trailing partial value in the input is ignored.

use std::env;
use std::fs;
use std::process;
use std::time::Instant;

fn quicksort(arr: &mut [i32], low: isize, high: isize) {
    if low < high {
        let pivot_idx = partition(arr, low as usize, high as usize);
        quicksort(arr, low, pivot_idx as isize - 1);
        quicksort(arr, pivot_idx as isize + 1, high);
    }
}

fn partition(arr: &mut [i32], low: usize, high: usize) -> usize {
    // Middle element as pivot
    arr.swap(low + (high - low) / 2, high);
    let pivot = arr[high];
    let mut i = low as isize - 1;

    for j in low..high {
        if arr[j] <= pivot {
            i += 1;
            arr.swap(i as usize, j);
        }
    }

    arr.swap((i + 1) as usize, high);
    (i + 1) as usize
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <input> <output>", args[0]);
        process::exit(2);
    }

    let bytes = match fs::read(&args[1]) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("cannot read {}: {}", args[1], e);
            process::exit(1);
        }
    };
    let mut values: Vec<i32> = bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let start = Instant::now();
    let n = values.len() as isize;
    quicksort(&mut values, 0, n - 1);
    let elapsed = start.elapsed();

    let out: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    if let Err(e) = fs::write(&args[2], out) {
        eprintln!("cannot write {}: {}", args[2], e);
        process::exit(1);
    }

    println!("Sorted {} values", values.len());
    println!("Execution time: {:.3} seconds", elapsed.as_secs_f64());
}
